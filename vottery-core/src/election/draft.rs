//! In-progress election draft and its reducer.
//!
//! The store holds the draft an author is building across the wizard steps
//! and applies [`DraftAction`]s as immutable-copy updates. No validation
//! happens here; the submitting flow validates before handing the draft to
//! the election API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Supported voting methods, matched exhaustively wherever the wizard
/// branches per method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingMethod {
    /// One choice per question; most votes wins
    Plurality,
    /// Voters rank choices; instant-runoff tallying
    RankedChoice,
    /// Voters approve any number of choices
    Approval,
}

/// A selectable answer within a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub text: String,
}

/// A ballot question with its nested choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub choices: Vec<Choice>,
}

/// Kind of attached media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

/// Reference to media attached to the draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRef {
    pub id: String,
    pub url: String,
    pub kind: MediaKind,
}

/// The election being authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionDraft {
    pub title: String,
    pub description: String,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub voting_method: VotingMethod,
    pub questions: Vec<Question>,
    pub media: Vec<MediaRef>,
}

impl Default for ElectionDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            starts_at: None,
            ends_at: None,
            voting_method: VotingMethod::Plurality,
            questions: Vec::new(),
            media: Vec::new(),
        }
    }
}

/// Mutations dispatched by the wizard. Ids referencing nothing are no-ops.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftAction {
    SetTitle(String),
    SetDescription(String),
    SetSchedule {
        starts_at: Option<DateTime<Utc>>,
        ends_at: Option<DateTime<Utc>>,
    },
    SetVotingMethod(VotingMethod),
    AddQuestion {
        prompt: String,
    },
    UpdateQuestion {
        id: String,
        prompt: String,
    },
    RemoveQuestion {
        id: String,
    },
    AddChoice {
        question_id: String,
        text: String,
    },
    UpdateChoice {
        question_id: String,
        choice_id: String,
        text: String,
    },
    RemoveChoice {
        question_id: String,
        choice_id: String,
    },
    AttachMedia {
        url: String,
        kind: MediaKind,
    },
    RemoveMedia {
        id: String,
    },
    Reset,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl ElectionDraft {
    /// Apply an action, returning the updated draft. The receiver is left
    /// untouched.
    pub fn apply(&self, action: DraftAction) -> Self {
        let mut next = self.clone();
        match action {
            DraftAction::SetTitle(title) => next.title = title,
            DraftAction::SetDescription(description) => next.description = description,
            DraftAction::SetSchedule { starts_at, ends_at } => {
                next.starts_at = starts_at;
                next.ends_at = ends_at;
            }
            DraftAction::SetVotingMethod(method) => next.voting_method = method,
            DraftAction::AddQuestion { prompt } => next.questions.push(Question {
                id: new_id(),
                prompt,
                choices: Vec::new(),
            }),
            DraftAction::UpdateQuestion { id, prompt } => {
                next.questions = next
                    .questions
                    .into_iter()
                    .map(|q| {
                        if q.id == id {
                            Question { prompt: prompt.clone(), ..q }
                        } else {
                            q
                        }
                    })
                    .collect();
            }
            DraftAction::RemoveQuestion { id } => {
                next.questions.retain(|q| q.id != id);
            }
            DraftAction::AddChoice { question_id, text } => {
                next.questions = next
                    .questions
                    .into_iter()
                    .map(|mut q| {
                        if q.id == question_id {
                            q.choices.push(Choice {
                                id: new_id(),
                                text: text.clone(),
                            });
                        }
                        q
                    })
                    .collect();
            }
            DraftAction::UpdateChoice {
                question_id,
                choice_id,
                text,
            } => {
                next.questions = next
                    .questions
                    .into_iter()
                    .map(|mut q| {
                        if q.id == question_id {
                            q.choices = q
                                .choices
                                .into_iter()
                                .map(|c| {
                                    if c.id == choice_id {
                                        Choice { text: text.clone(), ..c }
                                    } else {
                                        c
                                    }
                                })
                                .collect();
                        }
                        q
                    })
                    .collect();
            }
            DraftAction::RemoveChoice {
                question_id,
                choice_id,
            } => {
                next.questions = next
                    .questions
                    .into_iter()
                    .map(|mut q| {
                        if q.id == question_id {
                            q.choices.retain(|c| c.id != choice_id);
                        }
                        q
                    })
                    .collect();
            }
            DraftAction::AttachMedia { url, kind } => next.media.push(MediaRef {
                id: new_id(),
                url,
                kind,
            }),
            DraftAction::RemoveMedia { id } => {
                next.media.retain(|m| m.id != id);
            }
            DraftAction::Reset => next = Self::default(),
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let draft = ElectionDraft::default();
        assert_eq!(draft.voting_method, VotingMethod::Plurality);
        assert!(draft.questions.is_empty());
    }

    #[test]
    fn test_apply_leaves_receiver_untouched() {
        let draft = ElectionDraft::default();
        let next = draft.apply(DraftAction::SetTitle("Board election".to_string()));
        assert_eq!(draft.title, "");
        assert_eq!(next.title, "Board election");
    }

    #[test]
    fn test_question_lifecycle() {
        let draft = ElectionDraft::default()
            .apply(DraftAction::AddQuestion {
                prompt: "Who should chair?".to_string(),
            })
            .apply(DraftAction::AddQuestion {
                prompt: "Approve the budget?".to_string(),
            });
        assert_eq!(draft.questions.len(), 2);
        let first_id = draft.questions[0].id.clone();

        let updated = draft.apply(DraftAction::UpdateQuestion {
            id: first_id.clone(),
            prompt: "Who should chair the board?".to_string(),
        });
        assert_eq!(updated.questions[0].prompt, "Who should chair the board?");
        assert_eq!(updated.questions[1].prompt, "Approve the budget?");

        let removed = updated.apply(DraftAction::RemoveQuestion { id: first_id });
        assert_eq!(removed.questions.len(), 1);
        assert_eq!(removed.questions[0].prompt, "Approve the budget?");
    }

    #[test]
    fn test_choice_lifecycle() {
        let draft = ElectionDraft::default().apply(DraftAction::AddQuestion {
            prompt: "Pick one".to_string(),
        });
        let question_id = draft.questions[0].id.clone();

        let with_choices = draft
            .apply(DraftAction::AddChoice {
                question_id: question_id.clone(),
                text: "Alice".to_string(),
            })
            .apply(DraftAction::AddChoice {
                question_id: question_id.clone(),
                text: "Bob".to_string(),
            });
        assert_eq!(with_choices.questions[0].choices.len(), 2);

        let choice_id = with_choices.questions[0].choices[0].id.clone();
        let renamed = with_choices.apply(DraftAction::UpdateChoice {
            question_id: question_id.clone(),
            choice_id: choice_id.clone(),
            text: "Alice A.".to_string(),
        });
        assert_eq!(renamed.questions[0].choices[0].text, "Alice A.");

        let removed = renamed.apply(DraftAction::RemoveChoice {
            question_id,
            choice_id,
        });
        assert_eq!(removed.questions[0].choices.len(), 1);
        assert_eq!(removed.questions[0].choices[0].text, "Bob");
    }

    #[test]
    fn test_unknown_ids_are_no_ops() {
        let draft = ElectionDraft::default().apply(DraftAction::AddQuestion {
            prompt: "Pick one".to_string(),
        });
        let untouched = draft
            .apply(DraftAction::RemoveQuestion {
                id: "missing".to_string(),
            })
            .apply(DraftAction::AddChoice {
                question_id: "missing".to_string(),
                text: "ghost".to_string(),
            });
        assert_eq!(untouched, draft);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let draft = ElectionDraft::default()
            .apply(DraftAction::AddQuestion {
                prompt: "a".to_string(),
            })
            .apply(DraftAction::AddQuestion {
                prompt: "b".to_string(),
            });
        assert_ne!(draft.questions[0].id, draft.questions[1].id);
    }

    #[test]
    fn test_media_and_reset() {
        let draft = ElectionDraft::default()
            .apply(DraftAction::SetVotingMethod(VotingMethod::RankedChoice))
            .apply(DraftAction::AttachMedia {
                url: "https://cdn.vottery.com/banner.png".to_string(),
                kind: MediaKind::Image,
            });
        assert_eq!(draft.voting_method, VotingMethod::RankedChoice);
        assert_eq!(draft.media.len(), 1);

        let media_id = draft.media[0].id.clone();
        let cleared = draft.apply(DraftAction::RemoveMedia { id: media_id });
        assert!(cleared.media.is_empty());

        assert_eq!(cleared.apply(DraftAction::Reset), ElectionDraft::default());
    }

    #[test]
    fn test_voting_method_serialization() {
        assert_eq!(
            serde_json::to_string(&VotingMethod::RankedChoice).unwrap(),
            "\"ranked_choice\""
        );
    }
}
