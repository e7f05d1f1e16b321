//! A/B experiment: deterministic arm assignment and winner declaration
//!.

use crate::ids::SiteId;
use crate::types::{Experiment, ExperimentArm, ExperimentStatus};
use sha2::{Digest, Sha256};

pub const MIN_SAMPLES_PER_ARM: usize = 30;
pub const SIGNIFICANCE_P_THRESHOLD: f64 = 0.05;

/// `arm = H(site_id || exp_seed) mod 2`, deterministic per site per experiment.
pub fn assign_arm(site_id: SiteId, exp_seed: &str) -> ExperimentArm {
    let mut hasher = Sha256::new();
    hasher.update(site_id.to_string().as_bytes());
    hasher.update(exp_seed.as_bytes());
    let digest = hasher.finalize();
    if digest[0] % 2 == 0 {
        ExperimentArm::Control
    } else {
        ExperimentArm::Treatment
    }
}

/// Two-cell chi-squared test for independence between arm and correct/incorrect
/// outcome counts. Returns an approximate p-value via a coarse lookup, since
/// this crate does not depend on a full stats library for one distribution.
pub fn chi_squared_p_value(control_correct: usize, control_total: usize, treatment_correct: usize, treatment_total: usize) -> f64 {
    if control_total == 0 || treatment_total == 0 {
        return 1.0;
    }
    let n = (control_total + treatment_total) as f64;
    let control_incorrect = (control_total - control_correct) as f64;
    let treatment_incorrect = (treatment_total - treatment_correct) as f64;
    let control_correct = control_correct as f64;
    let treatment_correct = treatment_correct as f64;

    let row_correct = control_correct + treatment_correct;
    let row_incorrect = control_incorrect + treatment_incorrect;
    let col_control = control_total as f64;
    let col_treatment = treatment_total as f64;

    let expected = |row: f64, col: f64| row * col / n;
    let chi2 = [
        (control_correct, expected(row_correct, col_control)),
        (control_incorrect, expected(row_incorrect, col_control)),
        (treatment_correct, expected(row_correct, col_treatment)),
        (treatment_incorrect, expected(row_incorrect, col_treatment)),
    ]
    .iter()
    .filter(|(_, e)| *e > 0.0)
    .map(|(o, e)| (o - e).powi(2) / e)
    .sum::<f64>();

    p_value_from_chi2_df1(chi2)
}

/// Coarse lookup against the chi-squared(df=1) distribution — sufficient for
/// a 0.05 accept/reject gate without pulling in a full stats crate.
fn p_value_from_chi2_df1(chi2: f64) -> f64 {
    if chi2 >= 10.83 {
        0.001
    } else if chi2 >= 6.63 {
        0.01
    } else if chi2 >= 3.84 {
        0.05
    } else if chi2 >= 2.71 {
        0.10
    } else {
        1.0
    }
}

/// Winner is declared only if p < 0.05 AND improvement clears `min_improvement_pct`;
/// otherwise control remains active.
pub fn declare_winner(
    experiment: &mut Experiment,
    control_accuracy: f64,
    treatment_accuracy: f64,
    p_value: f64,
    min_improvement_pct: f64,
) {
    let improvement = treatment_accuracy - control_accuracy;
    if p_value < SIGNIFICANCE_P_THRESHOLD
        && improvement >= min_improvement_pct
        && experiment.counts.control >= MIN_SAMPLES_PER_ARM
        && experiment.counts.treatment >= MIN_SAMPLES_PER_ARM
    {
        experiment.winner = Some(ExperimentArm::Treatment);
    } else {
        experiment.winner = Some(ExperimentArm::Control);
    }
    experiment.status = ExperimentStatus::Concluded;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arm_assignment_is_deterministic() {
        let site = SiteId::new();
        let a = assign_arm(site, "exp-1");
        let b = assign_arm(site, "exp-1");
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_can_diverge() {
        let site = SiteId::new();
        let a = assign_arm(site, "exp-1");
        let b = assign_arm(site, "exp-2");
        // Not guaranteed to differ, but assignment must at least be callable
        // and well-defined for both seeds.
        let _ = (a, b);
    }

    #[test]
    fn winner_demoted_to_control_without_significance() {
        let mut experiment = Experiment {
            exp_id: crate::ids::ExperimentId::new(),
            control_config_id: crate::ids::ConfigId::new(),
            treatment_config_id: crate::ids::ConfigId::new(),
            status: ExperimentStatus::Running,
            assignment_seed: "seed".to_string(),
            counts: crate::types::ExperimentCounts { control: 50, treatment: 50 },
            winner: None,
        };
        declare_winner(&mut experiment, 80.0, 81.0, 0.5, 2.0);
        assert_eq!(experiment.winner, Some(ExperimentArm::Control));
    }
}
