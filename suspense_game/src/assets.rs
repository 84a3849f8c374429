use suspense_engine::ManifestLoader;

/// Every image and font the content references. Kept in one place so the
/// resource-validation test catches a renamed asset before a build ships.
pub fn manifest() -> ManifestLoader {
    ManifestLoader::new()
        .with_images([
            ("cryo", "background"),
            ("cryo", "pipes"),
            ("cryo", "door_closed"),
            ("cryo", "door_open"),
            ("cryo", "unit"),
            ("mess", "background"),
            ("mess", "shelf"),
            ("mess", "counter"),
            ("bridge", "background"),
            ("bridge", "comp_screen"),
            ("bridge", "console"),
            ("bridge", "camera_pan_0"),
            ("bridge", "camera_pan_1"),
            ("bridge", "camera_pan_2"),
            ("bridge", "camera_loop_0"),
            ("bridge", "camera_loop_1"),
            ("bridge", "camera_dead"),
            ("bridge", "loop_button"),
            ("items", "titanium_leg"),
            ("items", "full_can"),
            ("items", "empty_can"),
        ])
        .with_fonts(["prompt"])
}
