use std::collections::BTreeSet;
use std::fs;

use isadecode::isa::emit::NodeEntry;
use isadecode::isa::{DecodeTable, IsaSession};

use crate::table;

fn emit(session: &mut IsaSession) -> DecodeTable {
    let mut trees = session.all_trees().expect("subset trees");
    trees.push(
        session
            .forest_for("rv32ic", &["rv32i", "rvc"])
            .expect("merged forest"),
    );
    session.emit(&trees)
}

#[test]
fn rebuilds_write_identical_artifacts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut written = Vec::new();
    for run in 0..2 {
        let mut session = table::session();
        let table = emit(&mut session);
        let path = dir.path().join(format!("rv32ic-{run}.decode"));
        let file = fs::File::create(&path).expect("create artifact");
        table.write_to(file).expect("write artifact");
        written.push((fs::read(&path).expect("read artifact"), table.fingerprint()));
    }
    assert_eq!(written[0].0, written[1].0, "artifact bytes differ between runs");
    assert_eq!(written[0].1, written[1].1);
}

#[test]
fn sections_appear_in_contract_order() {
    let mut session = table::session();
    let text = emit(&mut session).render();
    let kinds: Vec<&str> = text
        .lines()
        .map(|line| line.split(' ').next().unwrap_or_default())
        .collect();
    let insns = session.instructions().len();
    assert!(kinds[..insns].iter().all(|kind| *kind == "insn"));
    assert_eq!(kinds[insns], "forest");
    let first_tag = kinds.iter().position(|kind| *kind == "tag").expect("tag lines");
    assert!(kinds[first_tag..].iter().all(|kind| *kind == "tag"), "tags close the artifact");
    let forests: Vec<&str> = text
        .lines()
        .filter(|line| line.starts_with("forest "))
        .filter_map(|line| line.split(' ').nth(1))
        .collect();
    assert_eq!(forests, vec!["rv32i", "rvc", "rv32ic"], "forests in request order");
}

#[test]
fn forests_hold_each_member_once_with_catchall_last() {
    let mut session = table::session();
    let table = emit(&mut session);
    for forest in &table.forests {
        let mut groups = BTreeSet::new();
        let mut leaves = BTreeSet::new();
        for node in &forest.nodes {
            match node {
                NodeEntry::Group { symbol, children, .. } => {
                    assert!(symbol.starts_with(&format!("{}#", forest.name)), "{symbol}");
                    assert!(groups.insert(symbol.clone()), "group {symbol} emitted twice");
                    let keys: Vec<&str> = children
                        .iter()
                        .filter_map(|child| forest.nodes.iter().find(|n| n.symbol() == child.as_str()))
                        .map(|child| match child {
                            NodeEntry::Group { key, .. } | NodeEntry::Leaf { key, .. } => key.as_str(),
                        })
                        .collect();
                    assert_eq!(keys.len(), children.len());
                    if let Some(position) = keys.iter().position(|key| *key == table.catchall_key) {
                        assert_eq!(position, keys.len() - 1, "catch-all child of {symbol} not last");
                    }
                }
                NodeEntry::Leaf { insn, .. } => {
                    assert!(leaves.insert(*insn), "instruction {insn} has two leaves");
                }
            }
        }
        assert_eq!(groups.len() as u32, forest.groups);
    }
    let rv32ic = table.forest("rv32ic").expect("merged forest");
    let leaf_count = rv32ic
        .nodes
        .iter()
        .filter(|node| matches!(node, NodeEntry::Leaf { .. }))
        .count();
    assert_eq!(leaf_count, session.instructions().len() - 1, "all but the disabled c.flw");
}

#[test]
fn leaf_metadata_is_emitted_verbatim() {
    let mut session = table::session();
    let text = emit(&mut session).render();
    let line = |symbol: &str| {
        text.lines()
            .find(|line| line.starts_with("insn ") && line.split(' ').nth(2) == Some(symbol))
            .unwrap_or_default()
            .to_owned()
    };
    assert!(line("lw").contains("resource=lsu:2:1"), "{}", line("lw"));
    assert!(
        line("lw").ends_with("args=out_reg#0[11-7];in_reg#0[19-15];simm#0[31-20]"),
        "{}",
        line("lw")
    );
    assert!(line("nop").contains(" trace=addi "), "{}", line("nop"));
    assert!(line("nop").contains(" handler=exec_nop fast=exec_nop "));
    assert!(line("c_lw").contains("hint=c.lw"));
    assert!(line("c_flw").contains("isa_tags=rvf"), "disabled records keep their metadata");
    assert!(line("c_jalr").ends_with("args=in_reg#0[11-7];const(1)"));
    assert!(text.contains("\ntag branch rv32i:jal rv32ic:jal rv32i:jalr rv32ic:jalr"));
}
