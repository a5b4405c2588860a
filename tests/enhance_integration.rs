use finescale::{
    EmbeddingMatrix, Enhanced, EnhanceModel, EnhanceOptions, FeatureMatrix, ResolutionData,
    enhance_features, select_features,
};
use ndarray::{Array2, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

fn labels(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{prefix}{}", i + 1)).collect()
}

fn random_embedding(n: usize, d: usize, prefix: &str, seed: u64) -> EmbeddingMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let values = Array2::from_shape_fn((n, d), |_| normal.sample(&mut rng));
    EmbeddingMatrix::new(values, labels(prefix, n), labels("D", d)).unwrap()
}

/// Features linear in the embedding plus noise, so every backend has signal.
fn measurements(p: usize, x: &EmbeddingMatrix, seed: u64) -> FeatureMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 0.2).unwrap();
    let values = Array2::from_shape_fn((p, x.n_samples()), |(i, s)| {
        let j = i % x.n_dims();
        2.0 + x.values[(s, j)] + 0.3 * i as f64 + normal.sample(&mut rng)
    });
    FeatureMatrix::new(values, labels("g", p), x.sample_ids.clone()).unwrap()
}

fn fixtures() -> (ResolutionData, ResolutionData) {
    let x_ref = random_embedding(50, 15, "r", 101);
    let x_enh = random_embedding(200, 15, "e", 102);
    let y_ref = measurements(10, &x_ref, 103);
    let reference = ResolutionData::new()
        .with_embedding("shared", x_ref)
        .with_measurement("counts", y_ref);
    let enhanced = ResolutionData::new().with_embedding("shared", x_enh);
    (reference, enhanced)
}

#[test]
fn linear_full_request_produces_shape_correct_object_with_finite_diagnostics() {
    let (reference, enhanced) = fixtures();
    // 50x15 reference, 10x50 measurements, 200x15 enhanced, all features.
    let opts = EnhanceOptions::new(EnhanceModel::Linear, "shared", "counts");
    let y_ref = reference.get_measurement("counts").unwrap().clone();
    let (predicted, diagnostics) = finescale::model::fit_and_predict(
        EnhanceModel::Linear,
        reference.get_embedding("shared").unwrap(),
        enhanced.get_embedding("shared").unwrap(),
        &y_ref,
    )
    .unwrap();
    assert_eq!(predicted.values.dim(), (10, 200));
    assert_eq!(diagnostics.len(), 10);
    assert!(diagnostics.values().all(|v| v.is_finite()));

    // The orchestration path writes the same shape into a copy.
    match enhance_features(&reference, &enhanced, &opts).unwrap() {
        Enhanced::Object(obj) => {
            let set = obj.get_measurement("counts").unwrap();
            assert_eq!(set.values.dim(), (10, 200));
            assert_eq!(set.feature_names, labels("g", 10));
            assert_eq!(set.sample_ids, labels("e", 200));
        }
        other => panic!("expected an updated object, got {other:?}"),
    }
}

#[test]
fn partially_absent_request_skips_one_and_returns_a_two_row_matrix() {
    let (reference, enhanced) = fixtures();
    let request = vec!["g2".to_string(), "g7".to_string(), "missing".to_string()];

    let selection =
        select_features(&request, reference.get_measurement("counts").unwrap()).unwrap();
    assert_eq!(selection.skipped, 1);
    assert_eq!(selection.names, vec!["g2", "g7"]);

    let mut opts = EnhanceOptions::new(EnhanceModel::Linear, "shared", "counts");
    opts.features = request;
    match enhance_features(&reference, &enhanced, &opts).unwrap() {
        Enhanced::Matrix { values, diagnostics } => {
            assert_eq!(values.values.dim(), (2, 200));
            assert_eq!(values.feature_names, vec!["g2", "g7"]);
            assert_eq!(diagnostics.len(), 2);
        }
        other => panic!("expected a raw matrix, got {other:?}"),
    }
}

#[test]
fn explicit_matrix_bypasses_stored_sets_and_always_returns_raw() {
    let (reference, enhanced) = fixtures();
    let explicit = measurements(4, reference.get_embedding("shared").unwrap(), 104);
    let mut opts = EnhanceOptions::new(EnhanceModel::Tree, "shared", "counts");
    opts.explicit_matrix = Some(explicit);
    // full request over the explicit matrix, yet the result is never attached
    match enhance_features(&reference, &enhanced, &opts).unwrap() {
        Enhanced::Matrix { values, diagnostics } => {
            assert_eq!(values.values.dim(), (4, 200));
            assert_eq!(diagnostics.len(), 4);
        }
        other => panic!("expected a raw matrix, got {other:?}"),
    }
}

#[test]
fn permuted_dimension_labels_warn_and_still_produce_correct_shapes() {
    let _ = env_logger::builder().is_test(true).try_init();
    let x_ref = random_embedding(50, 6, "r", 111);
    let mut shuffled = labels("D", 6);
    shuffled.rotate_left(2);
    let x_enh = EmbeddingMatrix::new(
        random_embedding(120, 6, "e", 112).values,
        labels("e", 120),
        shuffled,
    )
    .unwrap();
    let reference = ResolutionData::new()
        .with_embedding("shared", x_ref.clone())
        .with_measurement("counts", measurements(5, &x_ref, 113));
    let enhanced = ResolutionData::new().with_embedding("shared", x_enh.clone());

    for model in [
        EnhanceModel::Linear,
        EnhanceModel::Compositional,
        EnhanceModel::Tree,
    ] {
        let opts = EnhanceOptions::new(model, "shared", "counts");
        match enhance_features(&reference, &enhanced, &opts).unwrap() {
            Enhanced::Object(obj) => {
                let set = obj.get_measurement("counts").unwrap();
                assert_eq!(set.values.dim(), (5, 120));
            }
            other => panic!("expected an updated object, got {other:?}"),
        }
    }
    // the caller's object keeps its permuted labels
    assert_eq!(
        enhanced.get_embedding("shared").unwrap().dim_names,
        x_enh.dim_names
    );
}

#[test]
fn every_backend_honors_the_shape_and_naming_invariants() {
    let (reference, enhanced) = fixtures();
    for model in [
        EnhanceModel::Linear,
        EnhanceModel::Compositional,
        EnhanceModel::Tree,
    ] {
        let opts = EnhanceOptions::new(model, "shared", "counts");
        let obj = match enhance_features(&reference, &enhanced, &opts).unwrap() {
            Enhanced::Object(obj) => obj,
            other => panic!("expected an updated object, got {other:?}"),
        };
        let set = obj.get_measurement("counts").unwrap();
        assert_eq!(set.values.dim(), (10, 200), "{model} shape");
        assert_eq!(set.feature_names, labels("g", 10), "{model} row names");
        assert_eq!(set.sample_ids, labels("e", 200), "{model} column names");
    }
}

#[test]
fn compositional_predictions_stay_on_the_simplex_end_to_end() {
    let (reference, enhanced) = fixtures();
    let opts = EnhanceOptions::new(EnhanceModel::Compositional, "shared", "counts");
    let obj = match enhance_features(&reference, &enhanced, &opts).unwrap() {
        Enhanced::Object(obj) => obj,
        other => panic!("expected an updated object, got {other:?}"),
    };
    let set = obj.get_measurement("counts").unwrap();
    for column in set.values.axis_iter(Axis(1)) {
        assert!((column.sum() - 1.0).abs() < 1e-10);
    }
}

#[test]
fn tree_enhancement_is_deterministic_across_calls() {
    let (reference, enhanced) = fixtures();
    let mut opts = EnhanceOptions::new(EnhanceModel::Tree, "shared", "counts");
    opts.features = vec!["g1".to_string(), "g4".to_string()];
    let first = enhance_features(&reference, &enhanced, &opts).unwrap();
    let second = enhance_features(&reference, &enhanced, &opts).unwrap();
    match (first, second) {
        (
            Enhanced::Matrix { values: a, diagnostics: da },
            Enhanced::Matrix { values: b, diagnostics: db },
        ) => {
            assert_eq!(a.values, b.values);
            assert_eq!(da, db);
        }
        other => panic!("expected two raw matrices, got {other:?}"),
    }
}

#[test]
fn unlabeled_explicit_matrix_fails_for_every_model() {
    let (reference, enhanced) = fixtures();
    let unlabeled = FeatureMatrix::new(
        Array2::zeros((3, 50)),
        vec![],
        labels("r", 50),
    )
    .unwrap();
    for model in [
        EnhanceModel::Linear,
        EnhanceModel::Compositional,
        EnhanceModel::Tree,
    ] {
        let mut opts = EnhanceOptions::new(model, "shared", "counts");
        opts.explicit_matrix = Some(unlabeled.clone());
        let err = enhance_features(&reference, &enhanced, &opts).unwrap_err();
        assert!(
            matches!(
                err,
                finescale::EnhanceError::Data(finescale::DataError::MissingFeatureNames)
            ),
            "{model}: {err}"
        );
    }
}
