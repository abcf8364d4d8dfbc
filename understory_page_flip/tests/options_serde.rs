// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deserializing `FlipOptions` from host-supplied JSON.

#![cfg(feature = "serde")]

use understory_page_flip::{AnimationStyle, Easing, FlipConfig, FlipOptions};

#[test]
fn camel_case_keys_and_unknown_keys() {
    let options: FlipOptions = serde_json::from_str(
        r#"{
            "width": 1200,
            "autoPlay": true,
            "autoPlayInterval": 5000,
            "singleFirstPage": false,
            "animation": "slide",
            "easing": "ease-in-out",
            "theme": "dark"
        }"#,
    )
    .unwrap();

    let config = options.resolve().unwrap();
    assert_eq!(config.width, 1200.0);
    assert!(config.auto_play);
    assert_eq!(config.auto_play_interval, 5000);
    assert!(!config.single_first_page);
    assert_eq!(config.animation, AnimationStyle::Slide);
    assert_eq!(config.easing, Easing::EASE_IN_OUT);
    assert_eq!(config.height, FlipConfig::default().height);
}

#[test]
fn empty_object_is_all_defaults() {
    let options: FlipOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(options, FlipOptions::default());
}

#[test]
fn cubic_bezier_text_is_parsed() {
    let options: FlipOptions =
        serde_json::from_str(r#"{ "easing": "cubic-bezier(0.4, 0, 0.2, 1)" }"#).unwrap();
    assert_eq!(
        options.easing,
        Some(Easing::CubicBezier {
            x1: 0.4,
            y1: 0.0,
            x2: 0.2,
            y2: 1.0
        })
    );
}

#[test]
fn bad_easing_fails_to_deserialize() {
    let err = serde_json::from_str::<FlipOptions>(r#"{ "easing": "wobble" }"#).unwrap_err();
    assert!(err.to_string().contains("wobble"), "{err}");
}
