//! Golden test vectors.
//!
//! Roots and record hashes here were produced by an independent
//! implementation of the combine rule and record layout. Any change to
//! either shows up as a mismatch.

use serde::Serialize;
use valacc_core::{ChainAccumulator, ChainId, ChainRoot, DirectoryRecord, Sha256Hash};

use crate::fixtures::entry_sequence;

/// Expected root for the first `count` entries of [`entry_sequence`].
#[derive(Debug, Clone, Serialize)]
pub struct RootVector {
    pub name: &'static str,
    pub count: usize,
    pub expected_root: &'static str,
}

/// Get all root vectors.
pub fn root_vectors() -> Vec<RootVector> {
    vec![
        RootVector {
            name: "single entry is its own root",
            count: 1,
            expected_root: "22249aa61fd2594e50910aa574afbb977f9df8f7377e6f02e19c72245d899ad8",
        },
        RootVector {
            name: "one combine",
            count: 2,
            expected_root: "172e2a18aec23875fe2a2b93860e5db6701d4331d53aef1477391eb33bedc215",
        },
        RootVector {
            name: "unbalanced three",
            count: 3,
            expected_root: "7782481fe9bfe623531a38af2f2b419a7b66481e30833d4736cb12b53fa181f6",
        },
        RootVector {
            name: "balanced four",
            count: 4,
            expected_root: "c7d92e11236b6442c5879016c35a684a14775f41e2af59aea85a2d4fdcb3e390",
        },
        RootVector {
            name: "five entries",
            count: 5,
            expected_root: "366ae038bc2f091d4dc2f2fb5f30e0a0834ef0e7e0e8f3b6e04d87aff0252122",
        },
        RootVector {
            name: "balanced eight",
            count: 8,
            expected_root: "f5a8ce54915af174b9c2456293aa4e665316137b80a78d9f2de668855efa2b48",
        },
        RootVector {
            name: "one hundred",
            count: 100,
            expected_root: "7018880de2e4cafe1e66b3ef00836ec648269f430c24500c6f6199d7ebff6856",
        },
        RootVector {
            name: "one thousand",
            count: 1000,
            expected_root: "1fd5706e6b1a4655f608ad9a261a59e4b43c14c28bad4c7f0b545ab9fca3d6a0",
        },
    ]
}

/// `combine(0^32, 0^32)`.
pub const ZERO_COMBINE: &str = "2eeb74a6177f588d80c0c752b99556902ddf9682d0b906f5aa2adbaf8466a4e9";

/// Timestamp used by the record vectors.
pub const VECTOR_TIMESTAMP: i64 = 1_700_000_000_000_000_000;

/// Leaf record for chain `SHA-256("C")` holding `E1..E5` at height 0.
pub fn leaf_vector() -> (DirectoryRecord, &'static str) {
    let entries = entry_sequence(5);
    let root = ChainAccumulator::from_entries(&entries)
        .close()
        .unwrap_or(Sha256Hash::ZERO);
    let record = DirectoryRecord::leaf(
        0,
        0,
        VECTOR_TIMESTAMP,
        ChainId::derive("C"),
        Vec::new(),
        None,
        root,
        entries,
    );
    (
        record,
        "8c52894c4b1a6010bb8b9ffbac77cbc52a1bdc5b62148f2eaf9db6a6cae291ba",
    )
}

/// First directory record of accumulator 0 after sealing [`leaf_vector`].
pub fn directory_vector() -> (DirectoryRecord, &'static str) {
    let (leaf, _) = leaf_vector();
    let record = DirectoryRecord::directory(
        0,
        VECTOR_TIMESTAMP,
        ChainId::derive("Accumulator 0"),
        None,
        leaf.root,
        vec![ChainRoot {
            chain_id: leaf.chain_id,
            root: leaf.root,
        }],
    );
    (
        record,
        "1eb256fe545b1800f479171ef7f30be29e71313339f1214031bee3038ce5eafc",
    )
}

/// Anchor root of [`directory_vector`].
pub const DIRECTORY_ANCHOR: &str =
    "8e0c8673ce0ecfdd564b7261e6d720f013e17f43f380ef1405937027dc38d203";

/// Check every vector. Returns `(name, matches, computed hex)`.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let mut results: Vec<(String, bool, String)> = root_vectors()
        .iter()
        .map(|v| {
            let entries = entry_sequence(v.count);
            let hex = ChainAccumulator::from_entries(&entries)
                .close()
                .map(|root| root.to_hex())
                .unwrap_or_default();
            (v.name.to_string(), hex == v.expected_root, hex)
        })
        .collect();

    let zero = Sha256Hash::ZERO.combine(&Sha256Hash::ZERO).to_hex();
    results.push(("zero combine".to_string(), zero == ZERO_COMBINE, zero));

    let records = [
        ("leaf record", leaf_vector()),
        ("directory record", directory_vector()),
    ];
    for (name, (record, expected)) in records {
        let hex = record.hash().map(|h| h.to_hex()).unwrap_or_default();
        results.push((name.to_string(), hex == expected, hex));
    }

    let (directory, _) = directory_vector();
    let anchor = directory.anchor_root().map(|h| h.to_hex()).unwrap_or_default();
    results.push(("directory anchor".to_string(), anchor == DIRECTORY_ANCHOR, anchor));

    results
}

/// Root vectors as JSON, for other implementations to check against.
pub fn root_vectors_json() -> String {
    serde_json::to_string_pretty(&root_vectors()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_match() {
        for (name, ok, hex) in verify_all_vectors() {
            assert!(ok, "vector '{name}' computed {hex}");
        }
    }

    #[test]
    fn test_record_vector_lengths() {
        let (leaf, _) = leaf_vector();
        assert_eq!(leaf.encode().unwrap().len(), 284);
        let (directory, _) = directory_vector();
        assert_eq!(directory.encode().unwrap().len(), 188);
    }

    #[test]
    fn test_two_entry_root_is_combine() {
        let e = entry_sequence(2);
        assert_eq!(e[0].combine(&e[1]).to_hex(), root_vectors()[1].expected_root);
    }

    #[test]
    fn test_json_export() {
        let json: serde_json::Value = serde_json::from_str(&root_vectors_json()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), root_vectors().len());
        assert_eq!(json[0]["count"], 1);
    }
}
