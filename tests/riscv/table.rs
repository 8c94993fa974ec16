//! RV32I plus a slice of the compressed extension, described through the builder.

use isadecode::isa::{BuildOptions, CompatRule, IsaBuilder, IsaSession};

fn rv32i(builder: &mut IsaBuilder) {
    const S: &str = "rv32i";
    builder
        .instruction(S, "lui", "-------------------- ----- 0110111")
        .out_reg(0, "@(11-7)")
        .uimm(0, "@(31-12)<<12")
        .finish();
    builder
        .instruction(S, "auipc", "-------------------- ----- 0010111")
        .out_reg(0, "@(11-7)")
        .uimm(0, "@(31-12)<<12")
        .finish();
    builder
        .instruction(S, "jal", "-------------------- ----- 1101111")
        .out_reg(0, "@(11-7)")
        .simm(0, "@(31|19-12|20|30-21)<<1")
        .tag("branch")
        .finish();
    builder
        .instruction(S, "jalr", "------------ ----- 000 ----- 1100111")
        .out_reg(0, "@(11-7)")
        .in_reg(0, "@(19-15)")
        .simm(0, "@(31-20)")
        .tag("branch")
        .finish();
    for (label, funct3) in [
        ("beq", "000"),
        ("bne", "001"),
        ("blt", "100"),
        ("bge", "101"),
        ("bltu", "110"),
        ("bgeu", "111"),
    ] {
        builder
            .instruction(S, label, format!("------- ----- ----- {funct3} ----- 1100011"))
            .in_reg(0, "@(19-15)")
            .in_reg(1, "@(24-20)")
            .simm(0, "@(31|7|30-25|11-8)<<1")
            .tag("branch")
            .finish();
    }
    for (label, funct3) in [("lb", "000"), ("lh", "001"), ("lw", "010"), ("lbu", "100"), ("lhu", "101")] {
        builder
            .instruction(S, label, format!("------------ ----- {funct3} ----- 0000011"))
            .out_reg(0, "@(11-7)")
            .in_reg(0, "@(19-15)")
            .simm(0, "@(31-20)")
            .tag("mem")
            .resource("lsu", 2, 1)
            .finish();
    }
    for (label, funct3) in [("sb", "000"), ("sh", "001"), ("sw", "010")] {
        builder
            .instruction(S, label, format!("------- ----- ----- {funct3} ----- 0100011"))
            .in_reg(0, "@(19-15)")
            .in_reg(1, "@(24-20)")
            .simm(0, "@(31-25|11-7)")
            .tag("mem")
            .resource("lsu", 1, 1)
            .finish();
    }
    builder
        .instruction(S, "nop", "000000000000 00000 000 00000 0010011")
        .trace_label("addi")
        .handler("exec_nop")
        .finish();
    for (label, funct3) in [
        ("addi", "000"),
        ("slti", "010"),
        ("sltiu", "011"),
        ("xori", "100"),
        ("ori", "110"),
        ("andi", "111"),
    ] {
        builder
            .instruction(S, label, format!("------------ ----- {funct3} ----- 0010011"))
            .out_reg(0, "@(11-7)")
            .in_reg(0, "@(19-15)")
            .simm(0, "@(31-20)")
            .latency(1)
            .finish();
    }
    for (label, funct7, funct3) in [
        ("slli", "0000000", "001"),
        ("srli", "0000000", "101"),
        ("srai", "0100000", "101"),
    ] {
        builder
            .instruction(S, label, format!("{funct7} ----- ----- {funct3} ----- 0010011"))
            .out_reg(0, "@(11-7)")
            .in_reg(0, "@(19-15)")
            .uimm(0, "@(24-20)")
            .finish();
    }
    for (label, funct7, funct3) in [
        ("add", "0000000", "000"),
        ("sub", "0100000", "000"),
        ("sll", "0000000", "001"),
        ("slt", "0000000", "010"),
        ("sltu", "0000000", "011"),
        ("xor", "0000000", "100"),
        ("srl", "0000000", "101"),
        ("sra", "0100000", "101"),
        ("or", "0000000", "110"),
        ("and", "0000000", "111"),
    ] {
        builder
            .instruction(S, label, format!("{funct7} ----- ----- {funct3} ----- 0110011"))
            .out_reg(0, "@(11-7)")
            .in_reg(0, "@(19-15)")
            .in_reg(1, "@(24-20)")
            .finish();
    }
    builder
        .instruction(S, "fence", "---- ---- ---- ----- 000 ----- 0001111")
        .tag("system")
        .finish();
    builder
        .instruction(S, "ecall", "000000000000 00000 000 00000 1110011")
        .tag("system")
        .finish();
    builder
        .instruction(S, "ebreak", "000000000001 00000 000 00000 1110011")
        .tag("system")
        .finish();
}

fn rvc(builder: &mut IsaBuilder) {
    const S: &str = "rvc";
    builder
        .instruction(S, "c.lw", "010 --- --- -- --- 00")
        .out_creg(0, "@(4-2)")
        .in_creg(0, "@(9-7)")
        .uimm(0, "@(5|12-10|6)<<2")
        .decode_hint("c.lw")
        .tag("mem")
        .finish();
    builder
        .instruction(S, "c.flw", "011 --- --- -- --- 00")
        .out_creg(0, "@(4-2)")
        .in_creg(0, "@(9-7)")
        .uimm(0, "@(5|12-10|6)<<2")
        .isa_tag("rvf")
        .finish();
    builder
        .instruction(S, "c.sw", "110 --- --- -- --- 00")
        .in_creg(0, "@(9-7)")
        .in_creg(1, "@(4-2)")
        .uimm(0, "@(5|12-10|6)<<2")
        .tag("mem")
        .finish();
    builder
        .instruction(S, "c.nop", "000 0 00000 00000 01")
        .trace_label("c.addi")
        .finish();
    builder
        .instruction(S, "c.addi", "000 - ----- ----- 01")
        .out_reg(0, "@(11-7)")
        .in_reg(0, "@(11-7)")
        .simm(0, "@(12|6-2)")
        .finish();
    builder
        .instruction(S, "c.li", "010 - ----- ----- 01")
        .out_reg(0, "@(11-7)")
        .simm(0, "@(12|6-2)")
        .finish();
    builder
        .instruction(S, "c.j", "101 ----------- 01")
        .simm(0, "@(12|8|10-9|6|7|2|11|5-3)<<1")
        .tag("branch")
        .finish();
    builder
        .instruction(S, "c.beqz", "110 --- --- ----- 01")
        .in_creg(0, "@(9-7)")
        .simm(0, "@(12|6-5|2|11-10|4-3)<<1")
        .tag("branch")
        .finish();
    builder
        .instruction(S, "c.mv", "100 0 ----- ----- 10")
        .out_reg(0, "@(11-7)")
        .in_reg(0, "@(6-2)")
        .finish();
    builder
        .instruction(S, "c.jr", "100 0 ----- 00000 10")
        .in_reg(0, "@(11-7)")
        .tag("branch")
        .finish();
    builder
        .instruction(S, "c.add", "100 1 ----- ----- 10")
        .out_reg(0, "@(11-7)")
        .in_reg(0, "@(11-7)")
        .in_reg(1, "@(6-2)")
        .finish();
    builder
        .instruction(S, "c.jalr", "100 1 ----- 00000 10")
        .in_reg(0, "@(11-7)")
        .constant(1)
        .tag("branch")
        .finish();
    builder
        .instruction(S, "c.ebreak", "100 1 00000 00000 10")
        .tag("system")
        .finish();
}

pub fn builder() -> IsaBuilder {
    let mut builder = IsaBuilder::new();
    builder.options(BuildOptions::default().allow_mixed_widths(true));
    rv32i(&mut builder);
    rvc(&mut builder);
    builder
}

/// RV32IC with single-precision compressed loads disabled (no `rv32f` subset).
pub fn session() -> IsaSession {
    let mut builder = builder();
    builder.rule(CompatRule::require("rvf", "rv32f"));
    builder.build().expect("rv32ic session")
}
