use displaydoc::Display;

#[derive(Clone, Debug, Display)]
pub enum Error {
    /// edge `{0}` has an upper bound below its lower bound
    BoundsInverted(String),
    /// negative throughput cap on node `{0}`
    NegativeCapacity(String),
    /// expected exactly one supply source, found {0}
    SourceCount(usize),
    /// Max flow algorithm specific error
    AlgoSpecific(String),
}

impl std::error::Error for Error {}
