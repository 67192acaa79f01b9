pub mod abi;
pub mod block_processor;
pub mod chain_client;
pub mod classifier;
pub mod poll_loop;
pub mod rotator;
pub mod rpc_client;

pub use block_processor::{BlockOutcome, BlockProcessor, ProcessError};
pub use chain_client::{ChainClient, FailoverClient};
pub use classifier::ContractClassifier;
pub use poll_loop::{PollHandle, PollLoop, PollLoopConfig, PollStatus, TickOutcome};
pub use rotator::EndpointRotator;
pub use rpc_client::RpcClient;
