use img_smartpress::compressor::fallback_ladder;
use img_smartpress::decision::tuned_quality;
use img_smartpress::{
    analyzer, compute_target_box, output_file_name, plan, AnalyzerConfig, CompressionOptions,
    DecisionConfig, EncodingPlan, FallbackConfig, FormatSelection, ImageFeatures, ImageKind,
    OutputFormat, Overrides, Quality,
};
use proptest::prelude::*;
use std::path::Path;

fn any_output_format() -> impl Strategy<Value = OutputFormat> {
    prop_oneof![
        Just(OutputFormat::Jpeg),
        Just(OutputFormat::Png),
        Just(OutputFormat::WebP),
    ]
}

fn any_source_kind() -> impl Strategy<Value = ImageKind> {
    prop_oneof![
        Just(ImageKind::Jpeg),
        Just(ImageKind::Png),
        Just(ImageKind::WebP),
        Just(ImageKind::Bmp),
        Just(ImageKind::Tiff),
        Just(ImageKind::Gif),
    ]
}

fn any_quality() -> impl Strategy<Value = Quality> {
    prop_oneof![Just(Quality::Lossless), (1u8..=100).prop_map(Quality::Level)]
}

prop_compose! {
    fn any_features()(
        width in 1u32..10_000,
        height in 1u32..10_000,
        has_alpha in any::<bool>(),
        original_bytes in 1u64..50_000_000,
        difficulty in 0.0f64..=1.0,
    ) -> ImageFeatures {
        ImageFeatures {
            width,
            height,
            has_alpha,
            original_bytes,
            edge_density: difficulty,
            texture_variance: difficulty,
            difficulty_score: difficulty,
        }
    }
}

proptest! {
    #[test]
    fn test_target_box_fits_and_never_upscales(
        width in 1u32..20_000,
        height in 1u32..20_000,
        max_width in proptest::option::of(1u32..5_000),
        max_height in proptest::option::of(1u32..5_000),
    ) {
        match compute_target_box(width, height, max_width, max_height) {
            None => {
                prop_assert!(width <= max_width.unwrap_or(width));
                prop_assert!(height <= max_height.unwrap_or(height));
            }
            Some(target) => {
                prop_assert!(target.width >= 1 && target.height >= 1);
                prop_assert!(target.width <= width && target.height <= height);
                prop_assert!(target.width <= max_width.unwrap_or(width));
                prop_assert!(target.height <= max_height.unwrap_or(height));
            }
        }
    }

    #[test]
    fn test_target_box_preserves_aspect_ratio(
        width in 100u32..10_000,
        height in 100u32..10_000,
        max_side in 50u32..1_000,
    ) {
        if let Some(target) = compute_target_box(width, height, Some(max_side), Some(max_side)) {
            // each side is off by at most one pixel of rounding
            let skew = (target.width as i64 * height as i64 - target.height as i64 * width as i64).abs();
            prop_assert!(skew <= (width + height) as i64);
        }
    }

    #[test]
    fn test_quality_validation(quality in any::<u8>()) {
        let result = CompressionOptions::new(None, Some(quality), None, None);
        prop_assert_eq!(result.is_ok(), (1..=100).contains(&quality));
    }

    #[test]
    fn test_output_name_is_deterministic(
        stem in "[a-z][a-z0-9_-]{0,20}",
        format in any_output_format(),
        quality in proptest::option::of(1u8..=100),
    ) {
        let input = Path::new("/photos").join(format!("{}.src", stem));
        let first = output_file_name(&input, format.extension(), quality);
        let second = output_file_name(&input, format.extension(), quality);
        prop_assert_eq!(&first, &second);
        let expected_prefix = format!("{}_compress", stem);
        prop_assert!(first.starts_with(&expected_prefix));
        let expected_suffix = format!(".{}", format.extension());
        prop_assert!(first.ends_with(&expected_suffix));
        if let Some(q) = quality {
            let expected_quality = format!("_{}.", q);
            prop_assert!(first.contains(&expected_quality));
        }
    }

    #[test]
    fn test_tuned_quality_stays_in_band(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
        let config = DecisionConfig::default();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let q_low = tuned_quality(low, &config);
        let q_high = tuned_quality(high, &config);
        prop_assert!(q_low >= config.quality_floor && q_high <= config.quality_ceiling);
        prop_assert!(q_low <= q_high);
    }

    #[test]
    fn test_difficulty_score_is_bounded(edge in 0.0f64..=1.0, texture in 0.0f64..20.0) {
        let score = analyzer::difficulty_score(edge, texture, &AnalyzerConfig::default());
        prop_assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_auto_plan_keeps_alpha(features in any_features(), source in any_source_kind()) {
        let plans = plan(&features, source, &Overrides::default(), &DecisionConfig::default());
        prop_assert_eq!(plans.len(), 1);
        if features.has_alpha {
            prop_assert!(plans[0].format.supports_alpha());
        }
        if plans[0].format == OutputFormat::Png {
            prop_assert_eq!(plans[0].quality, Quality::Lossless);
        }
    }

    #[test]
    fn test_explicit_formats_give_one_plan_each(
        features in any_features(),
        source in any_source_kind(),
        formats in proptest::collection::vec(any_output_format(), 1..6),
        quality in proptest::option::of(1u8..=100),
    ) {
        let selection = FormatSelection::explicit(formats);
        let overrides = Overrides {
            formats: selection.clone(),
            quality: Quality::from(quality),
            ..Overrides::default()
        };
        let plans = plan(&features, source, &overrides, &DecisionConfig::default());
        prop_assert_eq!(plans.len(), selection.plan_count());
        if let FormatSelection::Explicit(formats) = selection {
            let planned: Vec<_> = plans.iter().map(|p| p.format).collect();
            prop_assert_eq!(planned, formats);
        }
    }

    #[test]
    fn test_fallback_ladder_respects_budget(
        format in any_output_format(),
        quality in any_quality(),
        source in any_source_kind(),
        retry_budget in 0u32..6,
        quality_step in 0u8..40,
        min_quality in 1u8..60,
    ) {
        let config = FallbackConfig { retry_budget, quality_step, min_quality };
        let plan = EncodingPlan { format, quality, target_box: None };
        let ladder = fallback_ladder(&plan, source, &config);

        prop_assert!(!ladder.is_empty());
        prop_assert!(ladder.len() <= retry_budget as usize + 1);
        prop_assert_eq!(ladder[0], (format, quality));

        let levels: Vec<u8> = ladder
            .iter()
            .filter(|(f, _)| *f == format)
            .filter_map(|(_, q)| q.level())
            .collect();
        prop_assert!(levels.windows(2).all(|pair| pair[1] < pair[0]));
    }
}
