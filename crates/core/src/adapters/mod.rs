pub mod chain;
pub mod decompiler;
pub mod explorer;
pub mod repository;

pub use chain::{ChainReader, MockChainReader};
pub use decompiler::{Decompilation, Decompiler, MockDecompiler, NullDecompiler};
pub use explorer::{
    AbiOnly, CreatorInfo, ExplorerClient, InternalTransaction, MockExplorerClient,
    VerifiedSource,
};
pub use repository::{MemoryRepository, Repository};
