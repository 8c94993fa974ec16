use proptest::prelude::*;
use proptest::test_runner::TestCaseResult;

use crate::isa::bits::BitMask;
use crate::isa::error::IsaError;
use crate::isa::instruction::{InsnId, InstructionRecord};
use crate::isa::options::BuildOptions;

use super::node::{DecodeNode, DecodeTree, OpcodeKey};

const WIDTH: usize = 8;
const MAX_INSNS: usize = 8;

fn pattern_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof![Just('0'), Just('1'), Just('-')], WIDTH)
        .prop_map(|symbols| symbols.into_iter().collect())
}

fn records(patterns: &[String]) -> Vec<InstructionRecord> {
    patterns
        .iter()
        .enumerate()
        .map(|(index, pattern)| {
            let mut record = InstructionRecord::new(format!("i{index}"), pattern.as_str())
                .expect("generated patterns are well formed");
            record.assign(InsnId::from_index(index), format!("i{index}"));
            record
        })
        .collect()
}

fn build(records: &[InstructionRecord]) -> Result<DecodeTree, IsaError> {
    let refs: Vec<&InstructionRecord> = records.iter().collect();
    DecodeTree::build("prop", &refs, &BuildOptions::default())
}

fn check_paths(node: &DecodeNode, tested: &BitMask, records: &[InstructionRecord]) -> TestCaseResult {
    let DecodeNode::Group(group) = node else {
        return Ok(());
    };
    for bit in group.test.bits() {
        prop_assert!(!tested.contains(bit), "bit {} tested twice on one path", bit);
    }
    let below = tested.union(&group.test.mask(tested.width()));
    for child in group.all_children() {
        for leaf in child.leaves() {
            let pattern = &records[leaf.insn.index()].pattern;
            let routed = pattern.field_value(group.test.first, group.test.width);
            match child.opcode() {
                OpcodeKey::Value(key) => prop_assert_eq!(routed.as_deref(), Some(key.as_str())),
                OpcodeKey::Catchall => prop_assert!(routed.is_none(), "concrete field in catch-all"),
                OpcodeKey::Root => prop_assert!(false, "child keyed as root"),
            }
        }
        check_paths(child, &below, records)?;
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]

    #[test]
    fn built_trees_are_sound(patterns in prop::collection::vec(pattern_strategy(), 1..=MAX_INSNS)) {
        let records = records(&patterns);
        let tree = match build(&records) {
            Ok(tree) => tree,
            Err(err) => {
                prop_assert!(err.is_decode_conflict(), "unexpected error: {}", err);
                prop_assert!(err.conflict_entries().len() >= 2);
                return Ok(());
            }
        };

        let again = build(&records).expect("second build of the same input");
        prop_assert_eq!(&tree, &again);

        let leaves = tree.leaves();
        prop_assert_eq!(leaves.len(), records.len(), "one leaf per instruction");
        for record in &records {
            let id = record.id().expect("registered");
            prop_assert_eq!(leaves.iter().filter(|leaf| leaf.insn == id).count(), 1);
        }

        check_paths(tree.root(), &BitMask::empty(WIDTH), &records)?;

        for record in &records {
            let word = record.pattern.value().clone();
            let resolved = tree.resolve(&word);
            prop_assert!(resolved.is_some(), "{} does not resolve its own encoding", record.label);
            if let Some(found) = resolved {
                prop_assert!(records[found.index()].matches(&word));
            }
        }
    }
}
