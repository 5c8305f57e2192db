use serde::{Deserialize, Serialize};

use super::ids::{Address, BucketId, ProviderId, ValuePropId};

/// A bucket as listed by the indexing backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub bucket_id: BucketId,
    pub name: String,
    pub owner: Address,
    pub msp_id: ProviderId,
    pub is_private: bool,
    pub value_prop_id: ValuePropId,
    #[serde(default)]
    pub file_count: u64,
    #[serde(default)]
    pub size_bytes: u64,
}

/// Main storage provider descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MspInfo {
    pub msp_id: ProviderId,
    /// libp2p multiaddresses, e.g. `/ip4/1.2.3.4/tcp/30333/p2p/12D3Koo...`
    pub multiaddresses: Vec<String>,
}

impl MspInfo {
    /// Extract the peer ids from the `/p2p/<id>` segment of each
    ///  multiaddress, deduplicated and in first-seen order.
    pub fn peer_ids(&self) -> Vec<String> {
        let mut peers: Vec<String> = Vec::new();
        for addr in &self.multiaddresses {
            let mut segments = addr.split('/').filter(|s| !s.is_empty());
            while let Some(segment) = segments.next() {
                if segment == "p2p" {
                    if let Some(peer) = segments.next() {
                        if !peers.iter().any(|p| p == peer) {
                            peers.push(peer.to_string());
                        }
                    }
                }
            }
        }
        peers
    }
}

/// Pricing/limit offer published by an MSP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueProposition {
    pub id: ValuePropId,
    pub price_per_giga_unit_per_tick: String,
    pub data_limit: u64,
    pub available: bool,
}
