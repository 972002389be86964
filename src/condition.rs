//! Readiness predicates and their combination into groups

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::locator::{ElementHandle, ElementList};
use crate::session::{DriverError, Session};

/// Typed result of a single condition check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Satisfied,
    NotSatisfied,
    /// The locator matched nothing
    NotFound,
    /// The bound reference went stale during the check
    Stale,
}

impl Outcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Outcome::Satisfied)
    }
}

/// A predicate over the current session state
#[derive(Debug)]
pub enum Condition<'a, E> {
    /// Element resolves, is displayed and has a non-empty box
    Visible(&'a ElementHandle<E>),
    /// Visible and enabled
    Clickable(&'a ElementHandle<E>),
    /// List is non-empty and its first element is visible
    FirstVisible(&'a ElementList),
}

impl<'a, E: Clone> Condition<'a, E> {
    pub fn label(&self) -> String {
        match self {
            Condition::Visible(handle) => format!("visible({})", handle.name()),
            Condition::Clickable(handle) => format!("clickable({})", handle.name()),
            Condition::FirstVisible(list) => format!("first-visible({})", list.name()),
        }
    }

    /// Check once. Transient driver signals become outcomes; anything else is
    /// returned as an error.
    pub async fn evaluate<S>(&self, session: &S) -> Result<Outcome>
    where
        S: Session<Element = E>,
    {
        let checked = match self {
            Condition::Visible(handle) => Self::check_handle(session, handle, false).await,
            Condition::Clickable(handle) => Self::check_handle(session, handle, true).await,
            Condition::FirstVisible(list) => match list.resolve_all(session).await {
                Ok(elements) => match elements.first() {
                    Some(first) => element_visible(session, first).await,
                    None => Ok(false),
                },
                Err(e) => Err(e),
            },
        };

        match checked {
            Ok(true) => Ok(Outcome::Satisfied),
            Ok(false) => Ok(Outcome::NotSatisfied),
            Err(DriverError::NoSuchElement(_)) => Ok(Outcome::NotFound),
            Err(DriverError::Stale(_)) => {
                if let Condition::Visible(handle) | Condition::Clickable(handle) = self {
                    handle.invalidate().await;
                }
                Ok(Outcome::Stale)
            }
            Err(DriverError::NotInteractable(_)) => Ok(Outcome::NotSatisfied),
            Err(DriverError::Fatal(e)) => {
                Err(e.context(format!("while checking {}", self.label())))
            }
        }
    }

    async fn check_handle<S>(
        session: &S,
        handle: &ElementHandle<E>,
        need_enabled: bool,
    ) -> Result<bool, DriverError>
    where
        S: Session<Element = E>,
    {
        let element = handle.resolve(session).await?;
        if !element_visible(session, &element).await? {
            return Ok(false);
        }
        if need_enabled {
            return session.is_enabled(&element).await;
        }
        Ok(true)
    }
}

async fn element_visible<S: Session>(
    session: &S,
    element: &S::Element,
) -> Result<bool, DriverError> {
    if !session.is_displayed(element).await? {
        return Ok(false);
    }
    Ok(session.bounding_box(element).await?.has_area())
}

/// How the members of a group combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Combinator {
    All,
    Any,
}

/// Ordered list of conditions combined by `All` or `Any`
#[derive(Debug)]
pub struct ConditionGroup<'a, E> {
    combinator: Combinator,
    members: Vec<Condition<'a, E>>,
}

/// Result of evaluating a group once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEvaluation {
    pub satisfied: bool,
    /// For `Any`, the index of the member that matched
    pub matched: Option<usize>,
    /// Outcomes of the members that were actually evaluated, in order
    pub outcomes: Vec<(String, Outcome)>,
}

impl GroupEvaluation {
    /// Most recent transient signal seen, for timeout diagnostics
    pub fn transient_signal(&self) -> Option<String> {
        self.outcomes
            .iter()
            .rev()
            .find(|(_, outcome)| matches!(outcome, Outcome::NotFound | Outcome::Stale))
            .map(|(label, outcome)| format!("{label}: {outcome:?}"))
    }
}

impl<'a, E: Clone> ConditionGroup<'a, E> {
    pub fn new(combinator: Combinator, members: Vec<Condition<'a, E>>) -> Self {
        ConditionGroup {
            combinator,
            members,
        }
    }

    pub fn all(members: Vec<Condition<'a, E>>) -> Self {
        Self::new(Combinator::All, members)
    }

    pub fn any_of(members: Vec<Condition<'a, E>>) -> Self {
        Self::new(Combinator::Any, members)
    }

    pub fn single(condition: Condition<'a, E>) -> Self {
        Self::new(Combinator::All, vec![condition])
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    pub fn members(&self) -> &[Condition<'a, E>] {
        &self.members
    }

    pub fn describe(&self) -> String {
        let joiner = match self.combinator {
            Combinator::All => " AND ",
            Combinator::Any => " OR ",
        };
        self.members
            .iter()
            .map(Condition::label)
            .collect::<Vec<_>>()
            .join(joiner)
    }

    /// Evaluate members in declaration order.
    ///
    /// `Any` stops at the first satisfied member, `All` at the first one that
    /// is not. Not-found and stale members count as not satisfied.
    pub async fn evaluate<S>(&self, session: &S) -> Result<GroupEvaluation>
    where
        S: Session<Element = E>,
    {
        let mut outcomes = Vec::with_capacity(self.members.len());

        for (index, member) in self.members.iter().enumerate() {
            let outcome = member.evaluate(session).await?;
            let satisfied = outcome.is_satisfied();
            outcomes.push((member.label(), outcome));

            match (self.combinator, satisfied) {
                (Combinator::Any, true) => {
                    return Ok(GroupEvaluation {
                        satisfied: true,
                        matched: Some(index),
                        outcomes,
                    });
                }
                (Combinator::All, false) => {
                    return Ok(GroupEvaluation {
                        satisfied: false,
                        matched: None,
                        outcomes,
                    });
                }
                _ => {}
            }
        }

        // Any: nothing matched. All: everything did (vacuously true when empty).
        let satisfied = self.combinator == Combinator::All;
        debug!("Group [{}] satisfied={}", self.describe(), satisfied);
        Ok(GroupEvaluation {
            satisfied,
            matched: None,
            outcomes,
        })
    }
}

#[cfg(test)]
#[path = "condition_test.rs"]
mod condition_test;
