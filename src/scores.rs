/// One provider outcome, listed in provider priority order.
///
/// `raw` is the provider's score as text; `None` means the provider had no
/// answer (including failures, which are reported as absence).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SourceScore {
    pub source: String,
    pub logo: Option<String>,
    pub raw: Option<String>,
}

/// Display-ready rating entry surviving normalization.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Badge {
    pub label: String,
    pub logo: Option<String>,
    pub score: String,
}

/// Filter unusable scores and format the survivors to one fractional digit.
///
/// A score is dropped when `raw` is absent, blank, unparsable, non-finite, or
/// exactly zero (providers report zero for titles they do not actually rate).
/// Input order is preserved.
pub fn badges_from_scores(scores: &[SourceScore]) -> Vec<Badge> {
    let mut badges = Vec::with_capacity(scores.len());
    for s in scores {
        let Some(raw) = s.raw.as_deref() else {
            continue;
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Ok(value) = trimmed.parse::<f64>() else {
            continue;
        };
        if !value.is_finite() || value == 0.0 {
            continue;
        }

        badges.push(Badge {
            label: s.source.clone(),
            logo: s.logo.clone(),
            score: format!("{value:.1}"),
        });
    }
    badges
}
