use isadecode::isa::{BitMask, BuildOptions, DecodeTree, IsaError, IsaSession};

use crate::table;

fn label<'s>(session: &'s IsaSession, tree: &DecodeTree, word: u64, width: usize) -> Option<&'s str> {
    let id = tree.resolve(&BitMask::from_u64(word, width))?;
    session.instruction(id).map(|record| record.label.as_str())
}

#[test]
fn resolves_rv32i_words() {
    let mut session = table::session();
    let tree = session.tree_for("rv32i").expect("rv32i tree");
    let cases = [
        (0x0000_0013, Some("nop")),
        (0x0010_0093, Some("addi")),
        (0x0000_4013, Some("xori")),
        (0x0020_81B3, Some("add")),
        (0x4020_81B3, Some("sub")),
        (0x4051_5293, Some("srai")),
        (0xFE20_8EE3, Some("beq")),
        (0x0081_2283, Some("lw")),
        (0x0000_0073, Some("ecall")),
        (0x0010_0073, Some("ebreak")),
        (0x0080_00EF, Some("jal")),
        (0xFFFF_FFFF, None),
        (0x0200_0033, None),
    ];
    for (word, expected) in cases {
        assert_eq!(label(&session, &tree, word, 32), expected, "word {word:#010x}");
    }
}

#[test]
fn nop_is_reached_before_generic_addi() {
    let mut session = table::session();
    let tree = session.tree_for("rv32i").expect("rv32i tree");
    let nop = session.instructions().iter().find(|r| r.label == "nop").expect("nop");
    let addi = session.instructions().iter().find(|r| r.label == "addi").expect("addi");
    let nop_id = nop.id().expect("registered");
    let addi_id = addi.id().expect("registered");

    let nop_path = tree.path_to(nop_id).expect("nop reachable");
    let owner = nop_path.last().expect("nop sits under a group");
    let addi_leaf = owner
        .catchall
        .as_ref()
        .and_then(|node| node.as_leaf())
        .expect("addi waits in the catch-all of nop's group");
    assert_eq!(addi_leaf.insn, addi_id);
    assert!(
        addi.pattern.care().count() < nop.pattern.care().count(),
        "nop fixes strictly more bits"
    );
    assert_eq!(tree.resolve(&BitMask::from_u64(0x0000_0013, 32)), Some(nop_id));
}

#[test]
fn branch_offsets_decode_from_split_ranges() {
    let session = table::session();
    let beq = session.instructions().iter().find(|r| r.label == "beq").expect("beq");
    let word = BitMask::from_u64(0xFE20_8EE3, 32);
    let values: Vec<_> = beq.arguments.iter().map(|arg| arg.value(&word)).collect();
    assert_eq!(values, vec![Some(1), Some(2), Some(-4)], "rs1, rs2, offset");
}

#[test]
fn resolves_compressed_words() {
    let mut session = table::session();
    let tree = session.tree_for("rvc").expect("rvc tree");
    let cases = [
        (0x0001, Some("c.nop")),
        (0x0085, Some("c.addi")),
        (0x4085, Some("c.li")),
        (0x4000, Some("c.lw")),
        (0xA001, Some("c.j")),
        (0x808A, Some("c.mv")),
        (0x8082, Some("c.jr")),
        (0x908A, Some("c.add")),
        (0x9082, Some("c.jalr")),
        (0x9002, Some("c.ebreak")),
        (0x6000, None),
    ];
    for (word, expected) in cases {
        assert_eq!(label(&session, &tree, word, 16), expected, "word {word:#06x}");
    }
}

#[test]
fn merged_forest_mixes_widths() {
    let mut session = table::session();
    let forest = session
        .forest_for("rv32ic", &["rv32i", "rvc"])
        .expect("mixed widths are enabled");
    assert_eq!(forest.width(), 32);
    let root = forest.root().as_group().expect("root group");
    assert_eq!((root.test.first, root.test.width), (0, 2), "quadrant bits split the widths");
    assert_eq!(label(&session, &forest, 0x0020_81B3, 32), Some("add"));
    assert_eq!(label(&session, &forest, 0x8082, 16), Some("c.jr"));
    assert_eq!(label(&session, &forest, 0x0001, 16), Some("c.nop"));
    assert_eq!(label(&session, &forest, 0x0013, 16), None, "32-bit template needs 32 bits");
}

#[test]
fn mixed_forest_needs_opt_in() {
    let mut builder = table::builder();
    builder.options(BuildOptions::default());
    let mut session = builder.build().expect("registration does not build trees");
    let err = session
        .forest_for("rv32ic", &["rv32i", "rvc"])
        .expect_err("16-bit and 32-bit instructions");
    assert!(matches!(err, IsaError::MalformedInstruction(_)), "unexpected error: {err}");
}

#[test]
fn compat_rule_disables_compressed_float_loads() {
    let mut session = table::session();
    let tree = session.tree_for("rvc").expect("rvc tree");
    let flw = session.instructions().iter().find(|r| r.label == "c.flw").expect("c.flw");
    let flw_id = flw.id().expect("registered");
    assert!(!tree.members().contains(&flw_id), "rule removed c.flw from the build input");

    let mut unrestricted = table::builder().build().expect("session without rules");
    let tree = unrestricted.tree_for("rvc").expect("rvc tree");
    assert_eq!(label(&unrestricted, &tree, 0x6000, 16), Some("c.flw"));
}

#[test]
fn tag_index_follows_registration_order() {
    let session = table::session();
    let branches: Vec<_> = session
        .insns_for_tag("branch")
        .iter()
        .map(|r| r.label.as_str())
        .collect();
    assert_eq!(
        branches,
        vec![
            "jal", "jalr", "beq", "bne", "blt", "bge", "bltu", "bgeu", "c.j", "c.beqz", "c.jr",
            "c.jalr"
        ]
    );
    let untagged: Vec<_> = session
        .insns_for_tag("rv32i")
        .iter()
        .map(|r| r.label.as_str())
        .collect();
    assert_eq!(&untagged[..4], &["lui", "auipc", "nop", "addi"]);
    assert!(!untagged.contains(&"beq"), "tagged instructions are not under the subset name");

    for (index, record) in session.instructions().iter().enumerate() {
        assert_eq!(record.id().map(|id| id.index()), Some(index), "ids are dense");
    }
}

#[test]
fn tag_selected_tree_spans_both_widths() {
    let mut session = table::session();
    let control = session
        .tree_for_tags("control", &["branch", "system"])
        .expect("control-flow tree");
    assert_eq!(label(&session, &control, 0xFE20_8EE3, 32), Some("beq"));
    assert_eq!(label(&session, &control, 0x0000_0073, 32), Some("ecall"));
    assert_eq!(label(&session, &control, 0x9002, 16), Some("c.ebreak"));
    assert_eq!(label(&session, &control, 0x0020_81B3, 32), None, "add is not selected");
}

#[test]
fn duplicate_encodings_are_reported_verbatim() {
    let mut builder = table::builder();
    builder
        .instruction("rv32i", "add.alias", "0000000 ----- ----- 000 ----- 0110011")
        .finish();
    let mut session = builder.build().expect("session");
    let err = session.tree_for("rv32i").expect_err("add and add.alias collide");
    assert!(err.is_decode_conflict());
    let message = err.to_string();
    assert!(message.contains("0000000 ----- ----- 000 ----- 0110011 add\n"), "{message}");
    assert!(message.contains("0000000 ----- ----- 000 ----- 0110011 add.alias"), "{message}");
}
