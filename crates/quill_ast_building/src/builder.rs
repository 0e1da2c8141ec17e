//! The group-driver state machine.
//!
//! The original suspend/resume behavior is kept exactly: each open block is a
//! frame on a strict LIFO stack holding the partially built statement and the
//! code node collecting its body; only the top frame is ever fed. A group
//! that opens a block re-queues its unconsumed remainder as the next group
//! (with a single trailing `}` split into its own group), and a group whose
//! candidates all fail closes the innermost frame when it starts with `}`.

use crate::cursor::TokenCursor;
use crate::error::{SyntaxError, SyntaxErrorKind};
use crate::grammar::{self, PendingStmt, StmtOutcome};
use quill_ast::{CodeBlock, NodeMeta, Root};
use quill_tokens::{Spanned, Token, TokenGroup};
use std::collections::VecDeque;
use tracing::trace;

/// Builds ASTs from token groups.
#[derive(Debug, Default, Clone)]
pub struct AstBuilder {
    interactive: bool,
}

struct ScopeFrame {
    pending: Option<PendingStmt>,
    code: CodeBlock,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// An interactive builder additionally admits bare expressions as
    /// statements, for REPL-style hosts.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Consumes the groups in order and produces the module root, or the
    /// merged best-effort diagnostic of the group no candidate accepted.
    pub fn build(
        &self,
        groups: impl IntoIterator<Item = TokenGroup>,
        name: impl Into<String>,
    ) -> Result<Root, SyntaxError> {
        let name = name.into();
        let mut queue: VecDeque<Vec<Token>> =
            groups.into_iter().map(|g| g.0).collect();
        let mut stack = vec![ScopeFrame {
            pending: None,
            code: CodeBlock::new(name, NodeMeta::default()),
        }];

        while let Some(group) = queue.pop_front() {
            let tokens: Vec<Token> = TokenGroup::new(group).stripped();
            if tokens.is_empty() {
                // a fully stripped group is silently skipped
                continue;
            }
            trace!("processing group of {} tokens: {tokens:?}", tokens.len());

            let mut errors = Vec::new();
            let mut matched = false;
            for (usage, candidate) in self.candidates() {
                let mut cur = TokenCursor::new(&tokens);
                match candidate(&mut cur) {
                    Ok(StmtOutcome::Complete(stmt)) => {
                        if let Some(extra) = cur.peek() {
                            errors.push(SyntaxError::expected_nothing(extra).with_usage(usage));
                            continue;
                        }
                        trace!("group accepted by {usage}");
                        stack
                            .last_mut()
                            .expect("root frame always present")
                            .code
                            .nodes
                            .push(stmt);
                        matched = true;
                        break;
                    }
                    Ok(StmtOutcome::Suspended(pending)) => {
                        trace!("group opened scope {:?} via {usage}", pending.scope_name());
                        let mut rest = cur.remaining().to_vec();
                        if rest.last().is_some_and(|t| t.is_special("}")) {
                            let brace = rest.pop().unwrap();
                            queue.push_front(vec![brace]);
                        }
                        if !rest.is_empty() {
                            queue.push_front(rest);
                        }
                        let scope_meta = NodeMeta::new(
                            tokens[0].span().line,
                            tokens[0].span().column,
                        );
                        let code = CodeBlock::new(pending.scope_name(), scope_meta);
                        stack.push(ScopeFrame {
                            pending: Some(pending),
                            code,
                        });
                        matched = true;
                        break;
                    }
                    Err(e) if e.fatal => {
                        let scope = self.scope_path(&stack);
                        return Err(e.with_scope(scope));
                    }
                    Err(e) => {
                        errors.push(e.with_usage(usage));
                    }
                }
            }

            if matched {
                continue;
            }

            // no candidate fit; a leading `}` closes the innermost open scope
            if tokens[0].is_special("}") && stack.len() > 1 {
                let frame = stack.pop().expect("stack len checked above");
                let stmt = frame
                    .pending
                    .expect("non-root frames always have a pending statement")
                    .finish(frame.code);
                trace!("closed scope, resuming parent");
                stack
                    .last_mut()
                    .expect("root frame always present")
                    .code
                    .nodes
                    .push(stmt);
                let rest: Vec<Token> = tokens[1..].to_vec();
                if !rest.is_empty() {
                    queue.push_front(rest);
                }
                continue;
            }

            let scope = self.scope_path(&stack);
            if errors.is_empty() {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::UnknownStructure,
                    tokens[0].span(),
                )
                .with_scope(scope));
            }
            return Err(SyntaxError::from_candidates(errors).with_scope(scope));
        }

        if stack.len() != 1 {
            let scope = self.scope_path(&stack);
            return Err(
                SyntaxError::new(SyntaxErrorKind::UnclosedBlock, None).with_scope(scope)
            );
        }
        let root = stack.pop().expect("root frame always present");
        Ok(Root { code: root.code })
    }

    fn candidates(&self) -> Vec<(&'static str, grammar::StmtCandidate)> {
        let mut candidates = grammar::CANDIDATES.to_vec();
        if self.interactive {
            candidates.push(grammar::INTERACTIVE_CANDIDATE);
        }
        candidates
    }

    fn scope_path(&self, stack: &[ScopeFrame]) -> String {
        stack
            .iter()
            .map(|f| f.code.name.as_str())
            .filter(|n| !n.is_empty())
            .collect::<Vec<_>>()
            .join(".")
    }
}
