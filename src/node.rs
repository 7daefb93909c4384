// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Node Parser: textual endpoint descriptors into interprocedural
//! nodes. Grounded on the `nom` grammar in `util::mem_watcher`'s `/proc`
//! parsing.

use std::fmt;

use nom::branch::alt;
use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::digit1;
use nom::combinator::{map, map_res, opt};
use nom::sequence::{preceded, terminated};
use nom::IResult;

use crate::error::{LtexError, Result};
use crate::procedure::{empty_field_path, FieldPath, ProcedureId};

/// An interprocedural "todo": a procedure paired with a locator denoting one
/// or more vertices in that procedure's lineage graph.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Node {
    pub procedure: ProcedureId,
    pub locator: Locator,
}

impl Node {
    pub fn new(procedure: ProcedureId, locator: Locator) -> Self {
        Node { procedure, locator }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}${}", self.procedure, self.locator)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Locator {
    Return(FieldPath),
    Argument(usize, FieldPath),
    ReturnOf(ProcedureId, FieldPath),
    ArgumentOf(ProcedureId, usize, FieldPath),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Return(_) => write!(f, "ret"),
            Locator::Argument(i, _) => write!(f, "arg{i}"),
            Locator::ReturnOf(callee, _) => write!(f, "retof({callee})"),
            Locator::ArgumentOf(callee, i, _) => write!(f, "argof({callee},{i})"),
        }
    }
}

fn ident(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

fn module_prefix(input: &str) -> IResult<&str, &str> {
    terminated(ident, tag(":"))(input)
}

fn procedure_id(input: &str) -> IResult<&str, ProcedureId> {
    let (input, module) = opt(module_prefix)(input)?;
    let (input, function) = ident(input)?;
    let (input, _) = tag("/")(input)?;
    let (input, arity) = map_res(digit1, |s: &str| s.parse::<u32>())(input)?;
    Ok((input, ProcedureId::new(module.unwrap_or(""), function, arity)))
}

fn location(input: &str) -> IResult<&str, Locator> {
    alt((
        map(tag("ret"), |_| Locator::Return(empty_field_path())),
        map(
            preceded(tag("arg"), map_res(digit1, |s: &str| s.parse::<usize>())),
            |index| Locator::Argument(index, empty_field_path()),
        ),
    ))(input)
}

fn endpoint(input: &str) -> IResult<&str, Node> {
    let (input, procedure) = procedure_id(input)?;
    let (input, _) = tag("$")(input)?;
    let (input, locator) = location(input)?;
    Ok((input, Node::new(procedure, locator)))
}

/// Parses a `[module:]function/arity$(ret|argN)` endpoint descriptor into an
/// interprocedural node. Fails with `BadEndpoint` on any deviation.
pub fn parse_endpoint(literal: &str) -> Result<Node> {
    match endpoint(literal) {
        Ok((remaining, node)) if remaining.is_empty() => Ok(node),
        _ => Err(LtexError::BadEndpoint {
            literal: literal.to_string(),
        }),
    }
}

/// Parses a `[module:]function/arity` sanitizer descriptor into a bare
/// procedure identifier. Fails with `BadEndpoint` on any deviation.
pub fn parse_sanitizer(literal: &str) -> Result<ProcedureId> {
    match procedure_id(literal) {
        Ok((remaining, procedure)) if remaining.is_empty() => Ok(procedure),
        _ => Err(LtexError::BadEndpoint {
            literal: literal.to_string(),
        }),
    }
}
