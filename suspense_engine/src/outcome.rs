use serde::Serialize;
use serde_json::Value;

/// The side effects one interaction asks the presentation layer to perform.
/// Handlers mutate game state *before* returning; the outcome itself stays
/// side-effect-free until the orchestrator processes it.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Outcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget: Option<WidgetRequest>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub end_game: bool,
}

impl Outcome {
    /// An outcome with no visible effect at all.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn message(text: impl Into<String>) -> Self {
        Outcome {
            message: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_sound(mut self, cue: impl Into<String>) -> Self {
        self.sound = Some(cue.into());
        self
    }

    pub fn with_detail(mut self, name: impl Into<String>) -> Self {
        self.detail = Some(name.into());
        self
    }

    pub fn with_widget(mut self, widget: WidgetRequest) -> Self {
        self.widget = Some(widget);
        self
    }

    pub fn ending_game(mut self) -> Self {
        self.end_game = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_none()
            && self.sound.is_none()
            && self.detail.is_none()
            && self.widget.is_none()
            && !self.end_game
    }
}

/// An opaque request for the presentation layer to display a widget; the
/// engine never interprets the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetRequest {
    pub kind: String,
    pub data: Value,
}

impl WidgetRequest {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }
}

/// What a handler may give back: nothing, one outcome, or a sequence of
/// optional outcomes flattened exactly one level.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Response {
    #[default]
    Nothing,
    One(Outcome),
    Many(Vec<Option<Outcome>>),
}

impl Response {
    /// Flattens into the processed form: `None` entries are dropped, order
    /// is preserved.
    pub fn into_outcomes(self) -> Vec<Outcome> {
        match self {
            Response::Nothing => Vec::new(),
            Response::One(outcome) => vec![outcome],
            Response::Many(entries) => entries.into_iter().flatten().collect(),
        }
    }
}

impl From<Outcome> for Response {
    fn from(outcome: Outcome) -> Self {
        Response::One(outcome)
    }
}

impl From<Option<Outcome>> for Response {
    fn from(outcome: Option<Outcome>) -> Self {
        match outcome {
            Some(outcome) => Response::One(outcome),
            None => Response::Nothing,
        }
    }
}

impl From<Vec<Option<Outcome>>> for Response {
    fn from(entries: Vec<Option<Outcome>>) -> Self {
        Response::Many(entries)
    }
}

impl From<Vec<Outcome>> for Response {
    fn from(entries: Vec<Outcome>) -> Self {
        Response::Many(entries.into_iter().map(Some).collect())
    }
}
