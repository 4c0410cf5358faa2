//! Property-based invariant tests for shelf label layout.
//!
//! These tests verify structural invariants that must hold for **any**
//! geometry and any batch of detections:
//!
//! 1. No overlap: committed spans on a line never share a cell.
//! 2. Occupancy equals the sum of placed text widths.
//! 3. Atomicity: a skipped detection leaves the grid unchanged.
//! 4. Determinism: the same input yields the same text and report.
//! 5. Output shape: three lines, each within the line width, no trailing
//!    whitespace.
//! 6. Report accounting: every detection is counted exactly once.
//! 7. Dedup spacing: kept detections are sorted and at least the minimum
//!    distance apart.
//! 8. Glyph widths: every glyph measures 1 or 2, text width is their sum.
//! 9. Block start is monotonic in position and keeps the block on the line.

use proptest::prelude::*;
use shelf_core::{Centi, DisplayGeometry, GlyphPolicy};
use shelf_layout::{
    CellGrid, Detection, LabelTriple, LayoutEngine, Line, Placement, SkipReason,
    dedup_by_distance, order_by_position,
};

// ── Helpers ─────────────────────────────────────────────────────────────

fn policy_strategy() -> impl Strategy<Value = GlyphPolicy> {
    prop_oneof![Just(GlyphPolicy::Hangul), Just(GlyphPolicy::Unicode)]
}

fn geometry_strategy() -> impl Strategy<Value = DisplayGeometry> {
    (1usize..=60)
        .prop_flat_map(|cpl| (Just(cpl), 1usize..=cpl, 1i64..=5_000))
        .prop_map(|(cpl, bw, dw)| {
            DisplayGeometry::new(cpl, bw, Centi::from_hundredths(dw))
                .expect("strategy only yields valid geometry")
        })
}

/// Display glyphs, with the occasional line break a field must not carry.
fn field_strategy() -> impl Strategy<Value = String> {
    let glyphs = vec!['A', 'b', '7', '(', ')', ' ', '가', '힣', '行', 'X'];
    let glyph = prop_oneof![
        20 => proptest::sample::select(glyphs),
        1 => proptest::sample::select(vec!['\n', '\r']),
    ];
    proptest::collection::vec(glyph, 0..=8).prop_map(|chars| chars.into_iter().collect())
}

/// Mostly well-formed triples, occasionally the wrong field count.
fn label_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        8 => (field_strategy(), field_strategy(), field_strategy())
            .prop_map(|(n, p, q)| format!("{n},{p},{q}")),
        1 => field_strategy(),
        1 => proptest::collection::vec(field_strategy(), 4..=5).prop_map(|f| f.join(",")),
    ]
}

/// Positions slightly beyond both ends of a display up to 50.00 wide.
fn detections_strategy(max_len: usize) -> impl Strategy<Value = Vec<Detection>> {
    proptest::collection::vec((-200i64..=5_200, label_strategy()), 0..=max_len).prop_map(
        |items| {
            items
                .into_iter()
                .enumerate()
                .map(|(i, (x, label))| Detection::new(i as u64, Centi::from_hundredths(x), label))
                .collect()
        },
    )
}

// ═════════════════════════════════════════════════════════════════════════
// 1–3. No overlap, occupancy accounting, atomicity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn placed_spans_never_overlap(
        geometry in geometry_strategy(),
        policy in policy_strategy(),
        detections in detections_strategy(24),
    ) {
        let engine = LayoutEngine::new(geometry, policy);
        let mut pass = engine.begin();
        let mut spans = Vec::new();

        for det in &detections {
            let before = pass.grid().clone();
            match pass.place(det) {
                Placement::Placed(plan) => spans.extend(plan.spans().iter().copied()),
                Placement::Skipped(reason) => {
                    prop_assert_eq!(
                        pass.grid(), &before,
                        "skip ({}) modified the grid", reason
                    );
                }
            }
        }

        for line in Line::ALL {
            let on_line: Vec<_> = spans.iter().filter(|s| s.line == line).collect();
            for (i, a) in on_line.iter().enumerate() {
                prop_assert!(a.end() <= geometry.chars_per_line());
                for b in &on_line[i + 1..] {
                    prop_assert!(
                        a.end() <= b.start || b.end() <= a.start,
                        "spans {:?} and {:?} overlap", a, b
                    );
                }
            }
            let written: usize = on_line.iter().map(|s| s.width).sum();
            prop_assert_eq!(pass.grid().occupied_count(line), written);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Determinism
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn layout_is_deterministic(
        geometry in geometry_strategy(),
        policy in policy_strategy(),
        detections in detections_strategy(16),
    ) {
        let engine = LayoutEngine::new(geometry, policy);
        let first = engine.layout(&detections);
        let second = engine.layout(&detections);
        prop_assert_eq!(first.text(), second.text());
        prop_assert_eq!(first.report, second.report);
        prop_assert_eq!(first.grid, second.grid);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5–6. Output shape and report accounting
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn output_has_three_bounded_lines(
        geometry in geometry_strategy(),
        policy in policy_strategy(),
        detections in detections_strategy(16),
    ) {
        let outcome = LayoutEngine::new(geometry, policy).layout(&detections);
        let text = outcome.text();
        let lines: Vec<&str> = text.split('\n').collect();
        prop_assert_eq!(lines.len(), 3);
        for line in lines {
            prop_assert_eq!(line, line.trim_end());
            prop_assert!(
                policy.text_width(line) <= geometry.chars_per_line(),
                "line {:?} wider than {}", line, geometry.chars_per_line()
            );
        }
    }

    #[test]
    fn every_detection_is_counted_once(
        geometry in geometry_strategy(),
        policy in policy_strategy(),
        detections in detections_strategy(16),
    ) {
        let engine = LayoutEngine::new(geometry, policy);
        let report = engine.layout(&detections).report;
        prop_assert_eq!(report.attempted(), detections.len());

        let malformed = detections
            .iter()
            .filter(|d| LabelTriple::parse(&d.label).is_err())
            .count();
        prop_assert_eq!(report.skipped_malformed, malformed);
    }

    #[test]
    fn a_lone_detection_never_collides(
        geometry in geometry_strategy(),
        policy in policy_strategy(),
        x in -200i64..=5_200,
        label in label_strategy(),
    ) {
        let det = Detection::new(0, Centi::from_hundredths(x), label);
        let placement = LayoutEngine::new(geometry, policy).placer().place(
            &mut CellGrid::new(geometry.chars_per_line()),
            &det,
        );
        let collided = matches!(placement, Placement::Skipped(SkipReason::Collision { .. }));
        prop_assert!(!collided);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Dedup spacing
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn dedup_keeps_sorted_spaced_subset(
        detections in detections_strategy(32),
        min_distance in 0i64..=600,
    ) {
        let min_distance = Centi::from_hundredths(min_distance);
        let mut sorted = detections.clone();
        order_by_position(&mut sorted);
        let (kept, dropped) = dedup_by_distance(sorted.clone(), min_distance);

        prop_assert_eq!(kept.len() + dropped, detections.len());
        if let Some(first) = sorted.first() {
            prop_assert_eq!(&kept[0], first, "first detection must survive");
        }
        for pair in kept.windows(2) {
            prop_assert!(pair[1].logical_x - pair[0].logical_x >= min_distance);
        }
        for det in &kept {
            prop_assert!(detections.contains(det));
        }
    }

    #[test]
    fn ordering_is_stable(detections in detections_strategy(32)) {
        let mut sorted = detections.clone();
        order_by_position(&mut sorted);
        for pair in sorted.windows(2) {
            prop_assert!(pair[0].logical_x <= pair[1].logical_x);
            if pair[0].logical_x == pair[1].logical_x {
                // Ids are assigned in input order.
                prop_assert!(pair[0].id < pair[1].id);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 8. Glyph widths
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn glyph_width_is_one_or_two(ch in any::<char>(), policy in policy_strategy()) {
        let w = policy.width(ch);
        prop_assert!(w == 1 || w == 2, "width({:?}) = {}", ch, w);
    }

    #[test]
    fn text_width_is_sum_of_glyphs(text in ".{0,24}", policy in policy_strategy()) {
        let sum: usize = text.chars().map(|ch| policy.width(ch)).sum();
        prop_assert_eq!(policy.text_width(&text), sum);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 9. Block start
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn block_start_is_monotonic_and_in_range(
        geometry in geometry_strategy(),
        a in -500i64..=6_000,
        b in -500i64..=6_000,
    ) {
        let engine = LayoutEngine::new(geometry, GlyphPolicy::Hangul);
        let (lo, hi) = (a.min(b), a.max(b));
        let start_lo = engine.placer().block_start(Centi::from_hundredths(lo));
        let start_hi = engine.placer().block_start(Centi::from_hundredths(hi));
        prop_assert!(start_lo <= start_hi);
        prop_assert!(start_hi + geometry.block_width() <= geometry.chars_per_line());
    }
}
