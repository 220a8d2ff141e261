use crate::bytecode::{Bytecode, Cell, Instruction, decode_at};

/// Print disassembly of a bytecode program
pub fn print_bc(bc: &Bytecode) {
    println!("=== BYTECODE PROGRAM ===\n");
    println!("{}\n", bc);

    println!("════════════════════════════════════════");
    println!(" main");
    println!(" {} cells", bc.len());
    println!("════════════════════════════════════════");
    print!("{}", disassemble_to_string(bc));
    println!();
}

/// One listing row: the address of its first cell and what was found there.
enum Row<'a> {
    Instr(Instruction),
    /// A cell that could not start an instruction; listed and skipped.
    Raw(&'a Cell, String),
}

fn rows(bc: &Bytecode) -> Vec<(usize, Row<'_>)> {
    let cells = bc.cells();
    let mut rows = Vec::new();
    let mut ip = 0;

    while ip < cells.len() {
        let start = ip;
        match decode_at(cells, &mut ip) {
            Ok(instr) => rows.push((start, Row::Instr(instr))),
            Err(e) => {
                rows.push((start, Row::Raw(&cells[start], e.to_string())));
                ip = start + 1;
            }
        }
    }

    rows
}

fn collect_jump_targets(rows: &[(usize, Row<'_>)]) -> Vec<usize> {
    let mut targets = Vec::new();

    for (_, row) in rows {
        if let Row::Instr(instr) = row {
            if let Some(target) = instr.target() {
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }
    }

    targets
}

// =============================================================================
// String output (for testing/logging)
// =============================================================================

/// Return disassembly as a String
pub fn disassemble_to_string(bc: &Bytecode) -> String {
    let rows = rows(bc);
    let jump_targets = collect_jump_targets(&rows);
    let mut output = String::new();

    for (ip, row) in &rows {
        if jump_targets.contains(ip) {
            output.push_str("      ┌──────────────────────────────────\n");
        }

        output.push_str(&format!("{:04} ", ip));

        if jump_targets.contains(ip) {
            output.push_str("► ");
        } else {
            output.push_str("  ");
        }

        match row {
            Row::Instr(instr) => output.push_str(&format_instr(instr, *ip)),
            Row::Raw(cell, reason) => {
                output.push_str(&format!(".cell       {:<8}; {}", cell.to_string(), reason))
            }
        }
        output.push('\n');
    }

    output
}

fn format_instr(instr: &Instruction, ip: usize) -> String {
    match instr {
        Instruction::Push(n) => format!("PUSH        {}", n),
        Instruction::Store(name) => format!("STORE       :{}", name),
        Instruction::Load(name) => format!("LOAD        :{}", name),
        Instruction::Jmp(target) => {
            format!("JMP         {:04} {}", target, direction(ip, *target))
        }
        Instruction::JmpIfZero(target) => {
            format!("JMP_ZERO    {:04} {}", target, direction(ip, *target))
        }
        Instruction::Print => "PRINT       ; ( value -- )".to_string(),
        Instruction::Swap => "SWAP        ; ( a b -- b a )".to_string(),
        other => other.opcode().mnemonic().to_uppercase(),
    }
}

fn direction(ip: usize, target: usize) -> &'static str {
    if target <= ip { "↑" } else { "↓" }
}
