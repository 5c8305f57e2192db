use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::{Address, BucketId, FileKey, Fingerprint};

/// Lifecycle of a file as reported by the indexing backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FileStatus {
    Pending,
    Ready,
    Rejected,
    Revoked,
    Expired,
    DeletionInProgress,
}

impl FileStatus {
    /// Failure states a file can land in without ever becoming ready
    pub fn is_terminal_failure(&self) -> bool {
        match self {
            FileStatus::Rejected | FileStatus::Revoked | FileStatus::Expired => true,
            FileStatus::Pending | FileStatus::Ready | FileStatus::DeletionInProgress => false,
        }
    }

    /// Whether the index may legally move a file from `self` to `next`.
    ///  Removal (the record disappearing) is not a status and
    ///  is only legal out of `DeletionInProgress`.
    pub fn can_transition_to(&self, next: FileStatus) -> bool {
        use FileStatus::*;
        matches!(
            (self, next),
            (Pending, Ready)
                | (Pending, Rejected)
                | (Pending, Revoked)
                | (Pending, Expired)
                | (Ready, DeletionInProgress)
        )
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileStatus::Pending => "pending",
            FileStatus::Ready => "ready",
            FileStatus::Rejected => "rejected",
            FileStatus::Revoked => "revoked",
            FileStatus::Expired => "expired",
            FileStatus::DeletionInProgress => "deletionInProgress",
        };
        f.write_str(s)
    }
}

/// Full record for a single file, as served by the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub file_key: FileKey,
    pub fingerprint: Fingerprint,
    pub bucket_id: BucketId,
    pub owner: Address,
    /// Name (path) of the file inside its bucket
    pub location: String,
    pub size_bytes: u64,
    pub status: FileStatus,
}

/// Nested folder/file listing for a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTree {
    pub bucket_id: BucketId,
    pub files: Vec<FileTreeNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FileTreeNode {
    #[serde(rename_all = "camelCase")]
    Folder {
        name: String,
        children: Vec<FileTreeNode>,
    },
    #[serde(rename_all = "camelCase")]
    File {
        name: String,
        file_key: FileKey,
        size_bytes: u64,
        status: FileStatus,
    },
}

/// One row of a flattened bucket listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub path: String,
    pub file_key: FileKey,
    pub size_bytes: u64,
    pub status: FileStatus,
}

impl FileTree {
    /// Flatten the tree depth-first, joining folder names with `/`.
    pub fn flatten(&self) -> Vec<FileEntry> {
        let mut out = Vec::new();
        for node in &self.files {
            flatten_node(node, "", &mut out);
        }
        out
    }
}

fn flatten_node(node: &FileTreeNode, prefix: &str, out: &mut Vec<FileEntry>) {
    match node {
        FileTreeNode::Folder { name, children } => {
            let prefix = join_path(prefix, name);
            for child in children {
                flatten_node(child, &prefix, out);
            }
        }
        FileTreeNode::File {
            name,
            file_key,
            size_bytes,
            status,
        } => out.push(FileEntry {
            path: join_path(prefix, name),
            file_key: *file_key,
            size_bytes: *size_bytes,
            status: *status,
        }),
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    let name = name.trim_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, byte: u8) -> FileTreeNode {
        FileTreeNode::File {
            name: name.to_string(),
            file_key: FileKey::from_bytes([byte; 32]),
            size_bytes: byte as u64,
            status: FileStatus::Ready,
        }
    }

    #[test]
    fn test_flatten_nested_folders() {
        let tree = FileTree {
            bucket_id: BucketId::from_bytes([0; 32]),
            files: vec![
                file("a.txt", 1),
                FileTreeNode::Folder {
                    name: "docs".into(),
                    children: vec![
                        file("b.txt", 2),
                        FileTreeNode::Folder {
                            name: "deep/".into(),
                            children: vec![file("c.txt", 3)],
                        },
                    ],
                },
            ],
        };

        let paths: Vec<_> = tree.flatten().into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["a.txt", "docs/b.txt", "docs/deep/c.txt"]);
    }

    #[test]
    fn test_transitions() {
        assert!(FileStatus::Pending.can_transition_to(FileStatus::Ready));
        assert!(FileStatus::Pending.can_transition_to(FileStatus::Expired));
        assert!(FileStatus::Ready.can_transition_to(FileStatus::DeletionInProgress));
        assert!(!FileStatus::Ready.can_transition_to(FileStatus::Pending));
        assert!(!FileStatus::Rejected.can_transition_to(FileStatus::Ready));
        assert!(!FileStatus::Pending.can_transition_to(FileStatus::DeletionInProgress));
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&FileStatus::DeletionInProgress).unwrap();
        assert_eq!(json, "\"deletionInProgress\"");
        let status: FileStatus = serde_json::from_str("\"revoked\"").unwrap();
        assert_eq!(status, FileStatus::Revoked);
    }

    #[test]
    fn test_tree_wire_format() {
        let json = r#"{
            "bucketId": "0x0000000000000000000000000000000000000000000000000000000000000000",
            "files": [
                {"type": "folder", "name": "x", "children": [
                    {"type": "file", "name": "y", "fileKey": "0x0101010101010101010101010101010101010101010101010101010101010101", "sizeBytes": 10, "status": "pending"}
                ]}
            ]
        }"#;
        let tree: FileTree = serde_json::from_str(json).unwrap();
        let flat = tree.flatten();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].path, "x/y");
        assert_eq!(flat[0].status, FileStatus::Pending);
    }
}
