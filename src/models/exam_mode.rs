// src/models/exam_mode.rs

use serde::{Deserialize, Serialize};

/// Named exam configuration. Official modes are eligible for the leaderboard;
/// `custom` is the client-side practice mode and is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ExamMode {
    Organisationnelle,
    Tresorerie,
    Custom,
}

/// Fixed parameters of an official exam mode.
#[derive(Debug, Clone, Serialize)]
pub struct ExamModeConfig {
    pub name: &'static str,
    pub description: &'static str,
    pub categories: &'static [&'static str],
    pub question_count: usize,
    /// Time limit in minutes.
    pub time_limit: u32,
}

const ORGANISATIONNELLE: ExamModeConfig = ExamModeConfig {
    name: "TAC1 Organisationnelle",
    description: "Examen officiel incluant les questions Organisationnel, CLR et Mouvement",
    categories: &["Organisationnel", "CLR", "Mouvement"],
    question_count: 50,
    time_limit: 30,
};

const TRESORERIE: ExamModeConfig = ExamModeConfig {
    name: "TAC1 Trésorerie",
    description: "Examen officiel incluant les questions Trésorerie, CLR et Mouvement",
    categories: &["Trésorerie", "CLR", "Mouvement"],
    question_count: 50,
    time_limit: 30,
};

impl ExamMode {
    pub const OFFICIAL: [ExamMode; 2] = [ExamMode::Organisationnelle, ExamMode::Tresorerie];

    /// Configuration of an official mode, `None` for `custom`.
    pub fn config(self) -> Option<&'static ExamModeConfig> {
        match self {
            ExamMode::Organisationnelle => Some(&ORGANISATIONNELLE),
            ExamMode::Tresorerie => Some(&TRESORERIE),
            ExamMode::Custom => None,
        }
    }

    pub fn is_official(self) -> bool {
        self.config().is_some()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExamMode::Organisationnelle => "organisationnelle",
            ExamMode::Tresorerie => "tresorerie",
            ExamMode::Custom => "custom",
        }
    }
}

impl std::fmt::Display for ExamMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
