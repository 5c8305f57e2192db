mod bucket;
mod file;
mod ids;

pub use bucket::{Bucket, MspInfo, ValueProposition};
pub use file::{FileEntry, FileInfo, FileStatus, FileTree, FileTreeNode};
pub use ids::{Address, BucketId, FileKey, Fingerprint, IdError, ProviderId, TxHash, ValuePropId};
