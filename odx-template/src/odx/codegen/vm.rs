//! Program execution

use super::program::{Instruction, Program, ProgramError};
use crate::odx::evaluation::Host;
use tracing::trace;

struct ListState {
    count: usize,
    index: usize,
}

/// Run a program against a host
///
/// The program is refused before any host call if its version is incompatible or its
/// jumps are malformed.
pub fn execute<H: Host + ?Sized>(program: &Program, host: &mut H) -> Result<(), ProgramError> {
    program.check_version()?;
    program.validate()?;

    let mut lists: Vec<ListState> = Vec::new();
    let mut pc = 0;

    while let Some(instruction) = program.instructions.get(pc) {
        trace!(pc, ?instruction, "execute");
        pc = match instruction {
            Instruction::BeginObject => {
                host.begin_object(None);
                pc + 1
            }
            Instruction::EndObject => {
                host.end_object();
                pc + 1
            }
            Instruction::Define { atom, expr } => {
                host.define(atom, expr);
                pc + 1
            }
            Instruction::BeginCondition {
                atom,
                expr,
                else_target,
            } => {
                if host.begin_condition(atom, expr) {
                    pc + 1
                } else {
                    *else_target
                }
            }
            Instruction::Jump { target } => *target,
            Instruction::BeginList {
                atom,
                expr,
                end_target,
            } => {
                let count = host.begin_list(atom, expr);
                lists.push(ListState { count, index: 0 });
                if count == 0 {
                    *end_target
                } else {
                    host.begin_object(Some(0));
                    pc + 1
                }
            }
            Instruction::NextItem { body_start } => {
                let Some(list) = lists.last_mut() else {
                    return Err(ProgramError::Malformed(format!(
                        "NextItem at instruction {} outside a list",
                        pc
                    )));
                };
                host.end_object();
                list.index += 1;
                if list.index < list.count {
                    host.begin_object(Some(list.index));
                    *body_start
                } else {
                    pc + 1
                }
            }
            Instruction::EndList => {
                if lists.pop().is_none() {
                    return Err(ProgramError::Malformed(format!(
                        "EndList at instruction {} outside a list",
                        pc
                    )));
                }
                host.end_list();
                pc + 1
            }
        };
    }

    Ok(())
}
