//! Recommendation engine.

use chrono::Utc;
use rota_config::{RecommendConfig, SchedulingRules};
use tracing::{debug, info};

use super::analysis::{analyze, ScheduleAnalysis, ScheduleSnapshot, VacationConflict};
use super::capabilities::{
    AvailabilitySwapPolicy, CoverageFinder, DemandPredictor, NoDemandPrediction,
    RecommendContext, SnapshotCoverageFinder, SnapshotVacationPlanner, SwapPolicy,
    VacationPlanner,
};
use super::{
    estimate_improvement, prioritize, GapFix, Priority, Recommendation, RecommendationBundle,
    RecommendationPayload, RecommendationType, SolutionKind, SolutionOption, SwapSuggestion,
    VacationSolution,
};
use crate::logging::{event_names, Stage};

const FAIRNESS_SUGGESTIONS: [&str; 4] = [
    "Implement rotation-based weekend assignments",
    "Balance holiday coverage across all PGY levels",
    "Ensure equal distribution of prime vacation slots",
    "Review and adjust call points system",
];

/// Builds recommendation bundles from snapshots.
pub struct RecommendationEngine {
    config: RecommendConfig,
    swap_policy: Box<dyn SwapPolicy>,
    coverage_finder: Box<dyn CoverageFinder>,
    vacation_planner: Box<dyn VacationPlanner>,
    demand_predictor: Box<dyn DemandPredictor>,
}

impl RecommendationEngine {
    /// Engine with snapshot-driven capabilities and no demand prediction.
    pub fn new(config: RecommendConfig) -> Self {
        Self {
            config,
            swap_policy: Box::new(AvailabilitySwapPolicy),
            coverage_finder: Box::new(SnapshotCoverageFinder),
            vacation_planner: Box::new(SnapshotVacationPlanner::default()),
            demand_predictor: Box::new(NoDemandPrediction),
        }
    }

    pub fn with_swap_policy(mut self, policy: impl SwapPolicy + 'static) -> Self {
        self.swap_policy = Box::new(policy);
        self
    }

    pub fn with_coverage_finder(mut self, finder: impl CoverageFinder + 'static) -> Self {
        self.coverage_finder = Box::new(finder);
        self
    }

    pub fn with_vacation_planner(mut self, planner: impl VacationPlanner + 'static) -> Self {
        self.vacation_planner = Box::new(planner);
        self
    }

    pub fn with_demand_predictor(mut self, predictor: impl DemandPredictor + 'static) -> Self {
        self.demand_predictor = Box::new(predictor);
        self
    }

    pub fn config(&self) -> &RecommendConfig {
        &self.config
    }

    pub fn analyze(
        &self,
        snapshot: &ScheduleSnapshot,
        constraints: &SchedulingRules,
    ) -> ScheduleAnalysis {
        analyze(snapshot, constraints)
    }

    /// Analyse `snapshot` and emit every applicable recommendation.
    pub fn generate(
        &self,
        snapshot: &ScheduleSnapshot,
        constraints: &SchedulingRules,
    ) -> RecommendationBundle {
        info!(
            event = event_names::RECOMMEND_STARTED,
            stage = %Stage::Recommend,
            residents = snapshot.residents.len(),
            "generating recommendations"
        );
        let ctx = RecommendContext {
            snapshot,
            rules: constraints,
        };
        let analysis = self.analyze(snapshot, constraints);
        debug!(
            stage = %Stage::Recommend,
            imbalance = analysis.workload_imbalance,
            fairness = analysis.fairness_score,
            gaps = analysis.coverage_gaps.len(),
            conflicts = analysis.vacation_conflicts.len(),
            compliance_issues = analysis.compliance_issues.len(),
            "schedule analysed"
        );

        let mut recommendations = Vec::new();
        if analysis.workload_imbalance > self.config.imbalance_threshold {
            recommendations.push(self.workload_balance(&ctx));
        }
        if !analysis.coverage_gaps.is_empty() {
            recommendations.push(self.coverage_fixes(&analysis, &ctx));
        }
        if !analysis.vacation_conflicts.is_empty() {
            recommendations.push(self.vacation_solutions(&analysis.vacation_conflicts, &ctx));
        }
        if analysis.fairness_score < constraints.fairness_threshold {
            recommendations.push(fairness_improvements());
        }
        recommendations.extend(self.predictive(&ctx));

        let priority_actions = prioritize(&recommendations, self.config.priority_action_limit);
        let estimated_improvement =
            estimate_improvement(&recommendations, &self.config.improvement);

        info!(
            event = event_names::RECOMMEND_FINISHED,
            stage = %Stage::Recommend,
            recommendations = recommendations.len(),
            priority_actions = priority_actions.len(),
            "recommendations ready"
        );
        RecommendationBundle {
            timestamp: Utc::now(),
            analysis,
            recommendations,
            priority_actions,
            estimated_improvement,
        }
    }

    fn workload_balance(&self, ctx: &RecommendContext<'_>) -> Recommendation {
        let average = ctx.snapshot.average_calls();
        let residents = &ctx.snapshot.residents;
        let overloaded: Vec<_> = residents
            .iter()
            .filter(|r| f64::from(r.call_count) > average * self.config.overload_factor)
            .collect();
        let underloaded: Vec<_> = residents
            .iter()
            .filter(|r| f64::from(r.call_count) < average * self.config.underload_factor)
            .collect();

        let mut swaps = Vec::new();
        'pairs: for over in &overloaded {
            for under in &underloaded {
                if swaps.len() >= self.config.max_swaps {
                    break 'pairs;
                }
                let dates = self.swap_policy.swappable_dates(over, under, ctx);
                if !dates.is_empty() {
                    swaps.push(SwapSuggestion {
                        from: over.id.clone(),
                        to: under.id.clone(),
                        dates,
                    });
                }
            }
        }

        Recommendation {
            kind: RecommendationType::WorkloadBalance,
            priority: Priority::High,
            description: format!(
                "Rebalance workload: {} overloaded, {} underloaded residents",
                overloaded.len(),
                underloaded.len()
            ),
            payload: RecommendationPayload::SuggestedSwaps(swaps),
            impact: "Improves fairness by 25%".to_string(),
        }
    }

    fn coverage_fixes(
        &self,
        analysis: &ScheduleAnalysis,
        ctx: &RecommendContext<'_>,
    ) -> Recommendation {
        let fixes: Vec<GapFix> = analysis
            .coverage_gaps
            .iter()
            .map(|gap| {
                let mut options = self.coverage_finder.candidates(gap, ctx);
                options.truncate(self.config.max_gap_options);
                GapFix {
                    gap_date: gap.date,
                    gap_type: gap.gap_type.clone(),
                    available_options: options,
                }
            })
            .collect();
        Recommendation {
            kind: RecommendationType::CoverageGaps,
            priority: Priority::Critical,
            description: format!("Fix {} coverage gaps", fixes.len()),
            payload: RecommendationPayload::Fixes(fixes),
            impact: "Ensures 100% coverage compliance".to_string(),
        }
    }

    fn vacation_solutions(
        &self,
        conflicts: &[VacationConflict],
        ctx: &RecommendContext<'_>,
    ) -> Recommendation {
        let solutions: Vec<VacationSolution> = conflicts
            .iter()
            .map(|conflict| {
                let moved = self
                    .vacation_planner
                    .alternative_dates(conflict, ctx)
                    .map(|range| format!("{} to {}", range.start, range.end))
                    .unwrap_or_else(|| "a period without coverage conflicts".to_string());
                let backup = self
                    .vacation_planner
                    .backup_resident(conflict, ctx)
                    .map(|r| r.name)
                    .unwrap_or_else(|| "no eligible resident".to_string());
                VacationSolution {
                    conflict: conflict.clone(),
                    options: vec![
                        SolutionOption {
                            kind: SolutionKind::Reschedule,
                            suggestion: format!("Move vacation to {}", moved),
                        },
                        SolutionOption {
                            kind: SolutionKind::Coverage,
                            suggestion: format!("Assign backup: {}", backup),
                        },
                        SolutionOption {
                            kind: SolutionKind::Split,
                            suggestion: "Split vacation into two periods to maintain coverage"
                                .to_string(),
                        },
                    ],
                }
            })
            .collect();
        Recommendation {
            kind: RecommendationType::VacationConflicts,
            priority: Priority::Medium,
            description: format!("Resolve {} vacation conflicts", solutions.len()),
            payload: RecommendationPayload::Solutions(solutions),
            impact: "Maintains coverage while honoring leave requests".to_string(),
        }
    }

    fn predictive(&self, ctx: &RecommendContext<'_>) -> Vec<Recommendation> {
        let mut out = Vec::new();
        let high_demand = self.demand_predictor.high_demand_periods(ctx);
        if !high_demand.is_empty() {
            out.push(Recommendation {
                kind: RecommendationType::Predictive,
                priority: Priority::Low,
                description: "Prepare for upcoming high-demand periods".to_string(),
                payload: RecommendationPayload::HighDemandPeriods(high_demand),
                impact: "Proactive planning reduces last-minute changes".to_string(),
            });
        }
        let conflicts = self.demand_predictor.future_conflicts(ctx);
        if !conflicts.is_empty() {
            out.push(Recommendation {
                kind: RecommendationType::Predictive,
                priority: Priority::Medium,
                description: "Potential future conflicts detected".to_string(),
                payload: RecommendationPayload::FutureConflicts(conflicts),
                impact: "Early intervention prevents scheduling issues".to_string(),
            });
        }
        out
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new(RecommendConfig::default())
    }
}

fn fairness_improvements() -> Recommendation {
    Recommendation {
        kind: RecommendationType::Fairness,
        priority: Priority::Medium,
        description: "Improve schedule fairness".to_string(),
        payload: RecommendationPayload::Suggestions(
            FAIRNESS_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        ),
        impact: "Increases satisfaction and reduces burnout".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::{CoverageGap, ResidentLoad};
    use chrono::NaiveDate;
    use rota_common::ResidentId;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn load(id: &str, dates: &[u32]) -> ResidentLoad {
        ResidentLoad {
            id: ResidentId::from(id),
            name: format!("Dr. {}", id),
            call_count: dates.len() as u32,
            pgy_level: None,
            consecutive_calls: None,
            weekend_calls: None,
            min_rest_days: None,
            assigned_dates: dates.iter().map(|&x| d(x)).collect(),
            unavailable_dates: Vec::new(),
        }
    }

    fn kinds(bundle: &RecommendationBundle) -> Vec<RecommendationType> {
        bundle.recommendations.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn balanced_schedule_gets_no_recommendations() {
        let snapshot = ScheduleSnapshot {
            residents: vec![
                load("a", &[2, 6, 10, 14]),
                load("b", &[3, 7, 11, 15]),
                load("c", &[4, 8, 12, 16]),
                load("d", &[5, 9, 13, 17]),
            ],
            ..Default::default()
        };
        let bundle =
            RecommendationEngine::default().generate(&snapshot, &SchedulingRules::default());
        assert_eq!(bundle.analysis.workload_imbalance, 0.0);
        assert!(bundle.recommendations.is_empty());
        assert!(bundle.priority_actions.is_empty());
        assert_eq!(bundle.estimated_improvement.fairness, 0.0);
    }

    #[test]
    fn imbalance_yields_swaps() {
        let snapshot = ScheduleSnapshot {
            residents: vec![
                load("heavy", &[2, 5, 9, 12, 16, 19, 23, 26]),
                load("light", &[14]),
                load("mid", &[3, 7, 21, 28]),
            ],
            ..Default::default()
        };
        let bundle =
            RecommendationEngine::default().generate(&snapshot, &SchedulingRules::default());
        let balance = &bundle.recommendations[0];
        assert_eq!(balance.kind, RecommendationType::WorkloadBalance);
        assert_eq!(balance.priority, Priority::High);
        assert_eq!(
            balance.description,
            "Rebalance workload: 1 overloaded, 1 underloaded residents"
        );
        let RecommendationPayload::SuggestedSwaps(swaps) = &balance.payload else {
            panic!("expected swaps");
        };
        assert_eq!(swaps.len(), 1);
        assert_eq!(swaps[0].from.as_str(), "heavy");
        assert_eq!(swaps[0].to.as_str(), "light");
        assert!(!swaps[0].dates.contains(&d(14)));
    }

    #[test]
    fn gaps_and_conflicts_are_independent() {
        let snapshot = ScheduleSnapshot {
            residents: vec![load("a", &[2, 9]), load("b", &[4, 11])],
            coverage_gaps: vec![CoverageGap {
                date: d(20),
                gap_type: "night".to_string(),
            }],
            vacation_conflicts: vec![VacationConflict {
                resident_id: ResidentId::from("a"),
                start_date: d(8),
                end_date: d(10),
                reason: None,
            }],
            fairness_score: Some(0.5),
            ..Default::default()
        };
        let bundle =
            RecommendationEngine::default().generate(&snapshot, &SchedulingRules::default());
        assert_eq!(
            kinds(&bundle),
            vec![
                RecommendationType::CoverageGaps,
                RecommendationType::VacationConflicts,
                RecommendationType::Fairness,
            ]
        );
        assert_eq!(bundle.priority_actions[0].kind, RecommendationType::CoverageGaps);
        assert_eq!(bundle.estimated_improvement.coverage, 30.0);
        assert_eq!(bundle.estimated_improvement.fairness, 20.0);
        assert_eq!(bundle.estimated_improvement.satisfaction, 40.0);

        let RecommendationPayload::Solutions(solutions) = &bundle.recommendations[1].payload else {
            panic!("expected solutions");
        };
        let options = &solutions[0].options;
        assert_eq!(options.len(), 3);
        assert_eq!(options[1].suggestion, "Assign backup: Dr. b");
        assert_eq!(
            options[2].suggestion,
            "Split vacation into two periods to maintain coverage"
        );
    }

    #[test]
    fn gap_options_are_capped() {
        let snapshot = ScheduleSnapshot {
            residents: (0..6).map(|i| load(&format!("r{}", i), &[1])).collect(),
            coverage_gaps: vec![CoverageGap {
                date: d(20),
                gap_type: "call".to_string(),
            }],
            ..Default::default()
        };
        let bundle =
            RecommendationEngine::default().generate(&snapshot, &SchedulingRules::default());
        let RecommendationPayload::Fixes(fixes) = &bundle.recommendations[0].payload else {
            panic!("expected fixes");
        };
        assert_eq!(fixes[0].available_options.len(), 3);
        assert_eq!(bundle.recommendations[0].description, "Fix 1 coverage gaps");
    }
}
