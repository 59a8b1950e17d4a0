//! Integration Tests for the feature contract
//!
//! Layout, vector and scaler working together the way the explainer uses them.

#[cfg(test)]
mod integration_tests {
    use crate::logic::error::CreditError;
    use crate::logic::features::{FeatureLayout, FeatureScaler, FeatureVector, FeatureVectorBuilder};
    use ndarray::array;

    fn credit_layout() -> FeatureLayout {
        FeatureLayout::new(["checking_status_low", "duration", "credit_amount", "age"]).unwrap()
    }

    /// A vector built for one layout is rejected by a reordered layout
    #[test]
    fn test_vector_bound_to_layout_order() {
        let layout = credit_layout();
        let vector = FeatureVector::from_layout(&layout, vec![1.0, 36.0, 25000.0, 30.0]).unwrap();
        assert!(vector.to_model_input(&layout).is_ok());

        let reordered =
            FeatureLayout::new(["duration", "checking_status_low", "credit_amount", "age"]).unwrap();
        assert!(matches!(
            vector.to_model_input(&reordered),
            Err(CreditError::ShapeMismatch { .. })
        ));
        assert_ne!(layout.hash(), reordered.hash());
    }

    /// NaN never reaches the model
    #[test]
    fn test_non_finite_rejected() {
        let layout = credit_layout();
        let vector = FeatureVectorBuilder::for_layout(&layout)
            .set("age", f64::NAN)
            .build();
        match vector.to_model_input(&layout) {
            Err(CreditError::ShapeMismatch { detail, .. }) => assert!(detail.contains("age")),
            other => panic!("expected ShapeMismatch, got {:?}", other),
        }
    }

    /// Scaled model input maps back to original units feature by feature
    #[test]
    fn test_scaler_matches_layout_width() {
        let layout = credit_layout();
        let raw = array![
            [0.0, 12.0, 2000.0, 25.0],
            [1.0, 24.0, 8000.0, 40.0],
            [0.0, 36.0, 14000.0, 55.0],
        ];
        let scaler = FeatureScaler::fit(raw.view()).unwrap();
        assert_eq!(scaler.width(), layout.len());

        let scaled = scaler.transform(raw.row(1));
        let vector = FeatureVector::from_layout(&layout, scaled.to_vec()).unwrap();
        let idx = layout.index_of("credit_amount").unwrap();
        let original = scaler.inverse_value(idx, vector.get("credit_amount").unwrap());
        assert!((original - 8000.0).abs() < 1e-9);
    }
}
