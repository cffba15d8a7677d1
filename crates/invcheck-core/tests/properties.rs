//! Structural properties of row grouping, region segmentation and column bisection.

use invcheck_core::invoice::Boundaries;
use invcheck_core::{RegionLabel, RegionSegmenter, Row, RowGrouper, Token};
use proptest::prelude::*;

fn tokens_strategy() -> impl Strategy<Value = Vec<Token>> {
    prop::collection::vec((0u32..800, 0u32..800, "[a-z]{1,6}"), 0..60).prop_map(|specs| {
        specs
            .into_iter()
            .map(|(x, y, text)| Token::new(text, x as f64, y as f64))
            .collect()
    })
}

fn rows_strategy() -> impl Strategy<Value = Vec<Row>> {
    let words = prop::sample::select(vec![
        "invoice", "bill to", "client", "description", "qty", "amount", "total", "summary",
        "vat [%]", "widget", "street", "12.00",
    ]);
    prop::collection::vec(prop::collection::vec(words, 1..4), 0..30).prop_map(|lines| {
        lines
            .into_iter()
            .enumerate()
            .map(|(i, words)| Row {
                tokens: words
                    .into_iter()
                    .enumerate()
                    .map(|(j, w)| Token::new(w, j as f64 * 80.0, i as f64 * 30.0))
                    .collect(),
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_rows_partition_tokens(tokens in tokens_strategy(), threshold in 1u32..60) {
        let threshold = threshold as f64;
        let rows = RowGrouper::new(threshold).group(&tokens);

        let grouped: usize = rows.iter().map(|r| r.tokens.len()).sum();
        prop_assert_eq!(grouped, tokens.len());

        for row in &rows {
            prop_assert!(!row.tokens.is_empty());
            prop_assert!(row.tokens.windows(2).all(|w| w[0].x <= w[1].x));

            let mut ys: Vec<f64> = row.tokens.iter().map(|t| t.y).collect();
            ys.sort_by(f64::total_cmp);
            prop_assert!(ys.windows(2).all(|w| w[1] - w[0] < threshold));
        }

        for pair in rows.windows(2) {
            let last = pair[0].tokens.iter().map(|t| t.y).fold(f64::NEG_INFINITY, f64::max);
            let first = pair[1].tokens.iter().map(|t| t.y).fold(f64::INFINITY, f64::min);
            prop_assert!(first - last >= threshold);
        }
    }

    #[test]
    fn prop_regions_partition_rows(rows in rows_strategy()) {
        let map = RegionSegmenter::default().segment(&rows);

        prop_assert_eq!(map.range(RegionLabel::Header).start, 0);
        for pair in RegionLabel::ALL.windows(2) {
            prop_assert_eq!(map.range(pair[0]).end, map.range(pair[1]).start);
        }
        prop_assert_eq!(map.range(RegionLabel::Footer).end, rows.len());

        for i in 0..rows.len() {
            let label = map.label_of(i);
            prop_assert!(label.is_some());
            let count = RegionLabel::ALL.iter().filter(|l| map.range(**l).contains(&i)).count();
            prop_assert_eq!(count, 1);
        }
    }

    #[test]
    fn prop_boundaries_bisect(
        centers in prop::collection::vec(0u32..2000, 1..12),
        probes in prop::collection::vec(0u32..3000, 0..40),
    ) {
        let centers: Vec<f64> = centers.into_iter().map(f64::from).collect();
        let boundaries = Boundaries::from_centers(&centers);
        let points = boundaries.points();

        prop_assert!(points.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(points[0], f64::NEG_INFINITY);
        prop_assert_eq!(points[points.len() - 1], f64::INFINITY);

        for x in probes {
            let column = boundaries.column_of(f64::from(x));
            prop_assert!(column < boundaries.column_count());
        }

        // A value on an inner boundary resolves to the column on its right.
        for (i, point) in points.iter().enumerate().take(points.len() - 1).skip(1) {
            prop_assert_eq!(boundaries.column_of(*point), i);
        }
    }
}
