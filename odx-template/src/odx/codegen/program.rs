//! Instruction programs
//!
//! A program is the logic tree flattened into a list of host calls and jumps. Jump targets
//! are instruction indices. Conditionals and lists lay out as:
//!
//! ```text
//! BeginCondition{else_target: E}     BeginList{end_target: N}
//!   ...body...                         ...item body...
//! Jump{target: X}                    NextItem{body_start}
//! E: ...alternative...               N: EndList
//! X:
//! ```
//!
//! The `Jump` only exists when the conditional has an alternative.

use crate::odx::atomizing::condition_atom;
use crate::odx::fields::FieldType;
use crate::odx::logic::{LogicNode, LogicTree};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version stamped on every generated program
pub const PROGRAM_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Instruction {
    BeginObject,
    EndObject,
    Define {
        atom: String,
        expr: String,
    },
    /// Evaluate a condition; when false continue at `else_target`
    BeginCondition {
        atom: String,
        expr: String,
        else_target: usize,
    },
    Jump {
        target: usize,
    },
    /// Evaluate a list; when empty continue at `end_target` (its `EndList`)
    BeginList {
        atom: String,
        expr: String,
        end_target: usize,
    },
    /// Close the current item; start the next one at `body_start` if any remain
    NextItem {
        body_start: usize,
    },
    EndList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramError {
    /// The program was generated by an incompatible version
    VersionMismatch { found: String, expected: String },
    /// A jump target or list bracket is out of place
    Malformed(String),
    /// The program could not be read or written
    Serialization(String),
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramError::VersionMismatch { found, expected } => write!(
                f,
                "Program version {} is not compatible with runtime version {}",
                found, expected
            ),
            ProgramError::Malformed(msg) => write!(f, "Malformed program: {}", msg),
            ProgramError::Serialization(msg) => write!(f, "Program serialization failed: {}", msg),
        }
    }
}

impl std::error::Error for ProgramError {}

impl From<serde_json::Error> for ProgramError {
    fn from(err: serde_json::Error) -> Self {
        ProgramError::Serialization(err.to_string())
    }
}

fn major_minor(version: &str) -> Option<(&str, &str)> {
    let mut parts = version.trim().split('.');
    let major = parts.next().filter(|p| !p.is_empty())?;
    let minor = parts.next().filter(|p| !p.is_empty())?;
    Some((major, minor))
}

/// Whether a program of `version` may run on this runtime (same major.minor)
pub fn is_compatible(version: &str) -> bool {
    match (major_minor(version), major_minor(PROGRAM_VERSION)) {
        (Some(found), Some(ours)) => found == ours,
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub version: String,
    pub instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self {
            version: PROGRAM_VERSION.to_string(),
            instructions,
        }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn check_version(&self) -> Result<(), ProgramError> {
        if is_compatible(&self.version) {
            Ok(())
        } else {
            Err(ProgramError::VersionMismatch {
                found: self.version.clone(),
                expected: PROGRAM_VERSION.to_string(),
            })
        }
    }

    /// Check every jump target and list bracket
    ///
    /// Jumps only go forward. Lists must nest: each `BeginList` is closed by a `NextItem`
    /// looping back to the instruction right after it, immediately followed by the
    /// `EndList` the `BeginList` names.
    pub fn validate(&self) -> Result<(), ProgramError> {
        let len = self.instructions.len();
        let malformed = |msg: String| Err(ProgramError::Malformed(msg));
        // (BeginList position, its end_target)
        let mut open: Vec<(usize, usize)> = Vec::new();

        for (pc, instruction) in self.instructions.iter().enumerate() {
            match instruction {
                Instruction::BeginCondition { else_target, .. } if *else_target <= pc || *else_target > len => {
                    return malformed(format!(
                        "else target {} of instruction {} is out of range",
                        else_target, pc
                    ));
                }
                Instruction::Jump { target } if *target <= pc || *target > len => {
                    return malformed(format!(
                        "jump target {} of instruction {} is out of range",
                        target, pc
                    ));
                }
                Instruction::BeginList { end_target, .. } => {
                    if *end_target <= pc
                        || !matches!(self.instructions.get(*end_target), Some(Instruction::EndList))
                    {
                        return malformed(format!(
                            "list at instruction {} does not end at an EndList",
                            pc
                        ));
                    }
                    open.push((pc, *end_target));
                }
                Instruction::NextItem { body_start } => {
                    let Some(&(begin, end_target)) = open.last() else {
                        return malformed(format!("NextItem at instruction {} outside a list", pc));
                    };
                    if *body_start != begin + 1 {
                        return malformed(format!(
                            "item body of instruction {} starts at {}, expected {}",
                            pc,
                            body_start,
                            begin + 1
                        ));
                    }
                    if end_target != pc + 1 {
                        return malformed(format!(
                            "list at instruction {} ends at {}, but its items close at {}",
                            begin, end_target, pc
                        ));
                    }
                }
                Instruction::EndList => {
                    let Some((begin, end_target)) = open.pop() else {
                        return malformed(format!("EndList at instruction {} outside a list", pc));
                    };
                    let closed_by_item =
                        matches!(pc.checked_sub(1).and_then(|p| self.instructions.get(p)), Some(Instruction::NextItem { .. }));
                    if end_target != pc || !closed_by_item {
                        return malformed(format!(
                            "EndList at instruction {} does not close the list at {}",
                            pc, begin
                        ));
                    }
                }
                _ => {}
            }
        }

        match open.last() {
            Some((begin, _)) => malformed(format!("list at instruction {} is never closed", begin)),
            None => Ok(()),
        }
    }

    pub fn to_json(&self) -> Result<String, ProgramError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, ProgramError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a program, refusing incompatible versions
    pub fn from_json(json: &str) -> Result<Self, ProgramError> {
        let program: Program = serde_json::from_str(json)?;
        program.check_version()?;
        program.validate()?;
        Ok(program)
    }
}

/// Flatten a logic tree into a program
pub fn generate(tree: &LogicTree) -> Program {
    let mut emitter = Emitter::default();
    emitter.push(Instruction::BeginObject);
    emitter.emit_nodes(&tree.nodes);
    emitter.push(Instruction::EndObject);
    Program::new(emitter.instructions)
}

#[derive(Default)]
struct Emitter {
    instructions: Vec<Instruction>,
}

impl Emitter {
    fn push(&mut self, instruction: Instruction) -> usize {
        self.instructions.push(instruction);
        self.instructions.len() - 1
    }

    fn next(&self) -> usize {
        self.instructions.len()
    }

    fn patch(&mut self, at: usize, to: usize) {
        match self.instructions.get_mut(at) {
            Some(Instruction::BeginCondition { else_target, .. }) => *else_target = to,
            Some(Instruction::Jump { target }) => *target = to,
            Some(Instruction::BeginList { end_target, .. }) => *end_target = to,
            _ => {}
        }
    }

    fn emit_nodes(&mut self, nodes: &[LogicNode]) {
        for node in nodes {
            self.emit_node(node);
        }
    }

    fn emit_node(&mut self, node: &LogicNode) {
        match node.node_type {
            FieldType::Content => {
                self.push(Instruction::Define {
                    atom: node.atom().to_string(),
                    expr: node.expr().to_string(),
                });
            }
            FieldType::If | FieldType::ElseIf => self.emit_condition(node),
            FieldType::Else => self.emit_nodes(&node.content_array),
            FieldType::List => {
                let start = self.push(Instruction::BeginList {
                    atom: node.atom().to_string(),
                    expr: node.expr().to_string(),
                    end_target: 0,
                });
                self.emit_nodes(&node.content_array);
                self.push(Instruction::NextItem {
                    body_start: start + 1,
                });
                let end = self.push(Instruction::EndList);
                self.patch(start, end);
            }
            FieldType::EndIf | FieldType::EndList | FieldType::Error => {}
        }
    }

    fn emit_condition(&mut self, node: &LogicNode) {
        let start = self.push(Instruction::BeginCondition {
            atom: condition_atom(node.atom()),
            expr: node.expr().to_string(),
            else_target: 0,
        });
        self.emit_nodes(node.body());

        match node.alternative() {
            Some(alternative) => {
                let jump = self.push(Instruction::Jump { target: 0 });
                let else_start = self.next();
                self.patch(start, else_start);
                self.emit_node(alternative);
                let end = self.next();
                self.patch(jump, end);
            }
            None => {
                let end = self.next();
                self.patch(start, end);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(id: &str, expr: &str, atom: &str) -> LogicNode {
        LogicNode::new(FieldType::Content, id).with_expr(expr, atom)
    }

    #[test]
    fn test_if_else_layout() {
        let tree = LogicTree::new(vec![LogicNode::new(FieldType::If, "1")
            .with_expr("x", "C1")
            .with_content(vec![
                content("2", "A", "C2"),
                LogicNode::new(FieldType::Else, "3").with_content(vec![content("4", "B", "C3")]),
            ])]);
        let program = generate(&tree);

        assert_eq!(
            program.instructions,
            vec![
                Instruction::BeginObject,
                Instruction::BeginCondition {
                    atom: "C1b".into(),
                    expr: "x".into(),
                    else_target: 4
                },
                Instruction::Define {
                    atom: "C2".into(),
                    expr: "A".into()
                },
                Instruction::Jump { target: 5 },
                Instruction::Define {
                    atom: "C3".into(),
                    expr: "B".into()
                },
                Instruction::EndObject,
            ]
        );
        assert!(program.validate().is_ok());
    }

    #[test]
    fn test_list_layout() {
        let tree = LogicTree::new(vec![LogicNode::new(FieldType::List, "1")
            .with_expr("Items", "L1")
            .with_content(vec![content("2", "Name", "C2"), content("1p", "_punc", "L1p")])]);
        let program = generate(&tree);

        assert_eq!(
            program.instructions[1],
            Instruction::BeginList {
                atom: "L1".into(),
                expr: "Items".into(),
                end_target: 5
            }
        );
        assert_eq!(program.instructions[4], Instruction::NextItem { body_start: 2 });
        assert_eq!(program.instructions[5], Instruction::EndList);
        assert!(program.validate().is_ok());
    }

    #[test]
    fn test_version_compatibility() {
        assert!(is_compatible(PROGRAM_VERSION));
        assert!(!is_compatible("99.0.0"));
        assert!(!is_compatible("garbage"));

        let (major, minor) = major_minor(PROGRAM_VERSION).unwrap();
        assert!(is_compatible(&format!("{major}.{minor}.999")));
    }

    #[test]
    fn test_from_json_refuses_mismatched_version() {
        let mut program = generate(&LogicTree::default());
        program.version = "99.1.0".to_string();
        let json = serde_json::to_string(&program).unwrap();

        let err = Program::from_json(&json).unwrap_err();
        assert!(matches!(err, ProgramError::VersionMismatch { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_targets() {
        let program = Program::new(vec![Instruction::Jump { target: 0 }]);
        assert!(matches!(program.validate(), Err(ProgramError::Malformed(_))));

        let program = Program::new(vec![Instruction::BeginList {
            atom: "L1".into(),
            expr: "xs".into(),
            end_target: 3,
        }]);
        assert!(program.validate().is_err());
    }

    fn list(end_target: usize) -> Instruction {
        Instruction::BeginList {
            atom: "L1".into(),
            expr: "Items".into(),
            end_target,
        }
    }

    #[test]
    fn test_validate_rejects_item_loop_onto_begin_list() {
        let json = serde_json::to_string(&Program::new(vec![
            Instruction::BeginObject,
            list(3),
            Instruction::NextItem { body_start: 1 },
            Instruction::EndList,
            Instruction::EndObject,
        ]))
        .unwrap();

        let err = Program::from_json(&json).unwrap_err();
        assert!(matches!(&err, ProgramError::Malformed(m) if m.contains("expected 2")), "{err}");
    }

    #[test]
    fn test_validate_rejects_unbalanced_list_brackets() {
        let stray_item = Program::new(vec![Instruction::NextItem { body_start: 0 }]);
        assert!(stray_item.validate().is_err());

        let stray_end = Program::new(vec![Instruction::EndList]);
        assert!(stray_end.validate().is_err());

        // end_target points at the outer EndList while the inner list closes first
        let crossed = Program::new(vec![
            list(6),
            list(3),
            Instruction::NextItem { body_start: 2 },
            Instruction::EndList,
            Instruction::NextItem { body_start: 1 },
            Instruction::EndList,
            Instruction::EndList,
        ]);
        assert!(crossed.validate().is_err());

        let unclosed = Program::new(vec![list(2), Instruction::NextItem { body_start: 1 }]);
        assert!(unclosed.validate().is_err());
    }

    #[test]
    fn test_nested_generated_lists_validate() {
        let inner = LogicNode::new(FieldType::List, "2")
            .with_expr("Lines", "L2")
            .with_content(vec![content("3", "Text", "C3")]);
        let tree = LogicTree::new(vec![LogicNode::new(FieldType::List, "1")
            .with_expr("Items", "L1")
            .with_content(vec![inner, content("1p", "_punc", "L1p")])]);

        assert!(generate(&tree).validate().is_ok());
    }

    #[test]
    fn test_json_round_trip_shape() {
        let program = generate(&LogicTree::new(vec![content("1", "A", "C1")]));
        let json = program.to_json().unwrap();
        assert!(json.contains(r#""op":"define""#));
        assert_eq!(Program::from_json(&json).unwrap(), program);
    }
}
