//! Build then run: the runtime must load exactly the file the build wrote.

mod common;

use std::fs;

use common::{component_with_script, runtime, RecordingEngine};
use lovejs_bundler::instruction::Value;
use lovejs_bundler::runtime::{ParameterView, RenderHandle};
use lovejs_bundler::{bundle_components, BundleOptions, BundlePlan};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn widget_script_is_built_and_initialized() {
    let dir = tempfile::tempdir().unwrap();

    // Build
    let widget = component_with_script(
        "App",
        "Widget",
        &[
            ("GlobalBundle", Value::from(false)),
            ("BundleName", Value::from("index")),
            ("OnInit", Value::from("run")),
        ],
        "export const run = () => {}",
    );
    let plan = BundlePlan::new(dir.path(), vec![widget]);
    let out_dir = plan.output_dir();
    let result = bundle_components(plan, BundleOptions::default())
        .await
        .unwrap();

    assert_eq!(result.bundles.len(), 1);
    let emitted = fs::read_to_string(out_dir.join("App.Widget.index.g.js")).unwrap();
    assert_eq!(
        emitted,
        "// Auto-generated bundle: App.Widget.index\nexport const run = () => {}\n"
    );

    // Run
    let engine = RecordingEngine::new();
    let rt = runtime(&engine);
    let mut site = rt.new_site();
    site.attach(RenderHandle::new("App.Widget")).unwrap();
    site.set_parameters(
        ParameterView::new()
            .with("ChildContent", "export const run = () => {}")
            .with("GlobalBundle", false)
            .with("BundleName", "index")
            .with("OnInit", "run"),
    )
    .unwrap();

    let expected_path = format!("./loveJS/{}", result.bundles[0].file_name);
    assert_eq!(site.script_path(), Some(expected_path.as_str()));

    site.after_render().await.unwrap();
    site.after_render().await.unwrap();

    assert_eq!(engine.imports(), vec![expected_path]);
    assert_eq!(engine.invoked("run"), 1);
}

#[tokio::test]
async fn class_wrapped_build_matches_qualified_runtime_calls() {
    let bundled = component_with_script(
        "Blazor.LoveJS.IntegrationTests",
        "Bundled",
        &[
            ("GlobalBundle", Value::from(true)),
            ("AddToGlobal", Value::from(true)),
        ],
        "static run() {}",
    );
    let result = bundle_components(
        BundlePlan::new(".", vec![bundled]),
        BundleOptions {
            wrap_in_class: true,
            write_to_disk: false,
            ..BundleOptions::default()
        },
    )
    .await
    .unwrap();

    let content = &result.bundles[0].content;
    assert!(content.contains("export class Blazor_LoveJS_IntegrationTests_Bundled {"));
    assert!(content.contains(
        "globalThis.Blazor_LoveJS_IntegrationTests_Bundled = Blazor_LoveJS_IntegrationTests_Bundled;"
    ));

    let engine = RecordingEngine::new();
    let mut site = runtime(&engine).new_site();
    site.attach(RenderHandle::new("App.Widget")).unwrap();
    site.set_parameters(
        ParameterView::new()
            .with("GlobalBundle", true)
            .with("ClassName", "Blazor_LoveJS_IntegrationTests_Bundled")
            .with("OnInit", "run"),
    )
    .unwrap();
    site.after_render().await.unwrap();

    assert_eq!(engine.imports(), vec!["./loveJS/index.g.js"]);
    assert_eq!(engine.invoked("Blazor_LoveJS_IntegrationTests_Bundled.run"), 1);
}

#[tokio::test]
async fn script_file_override_does_not_change_emission() {
    let component = component_with_script(
        "App",
        "Widget",
        &[("ScriptFile", Value::from("./custom.js"))],
        "export const run = () => {}",
    );
    let result = bundle_components(
        BundlePlan::new(".", vec![component]),
        BundleOptions {
            write_to_disk: false,
            ..BundleOptions::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(result.bundles[0].file_name, "App.Widget.index.g.js");
}

#[tokio::test]
async fn wrapped_component_with_two_declarations_loads_with_default_class() {
    let mut widget = component_with_script("App", "Widget", &[], "static a() {}");
    let second = component_with_script("App", "Widget", &[], "static run() {}");
    widget.instructions.extend(second.instructions);

    let result = bundle_components(
        BundlePlan::new(".", vec![widget]),
        BundleOptions {
            wrap_in_class: true,
            write_to_disk: false,
            ..BundleOptions::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(result.fragments, 2);
    assert_eq!(
        result.bundles[0].content,
        "// Auto-generated bundle: App.Widget.index\n\
         export class App_Widget {\n    static a() {}\n    static run() {}\n}\n"
    );

    let engine = RecordingEngine::new();
    let mut site = runtime(&engine).with_class_wrapping(true).new_site();
    site.attach(RenderHandle::new("App.Widget")).unwrap();
    site.set_parameters(ParameterView::new().with("OnInit", "run"))
        .unwrap();
    site.after_render().await.unwrap();

    assert_eq!(engine.imports(), vec!["./loveJS/App.Widget.index.g.js"]);
    assert_eq!(engine.invoked("App_Widget.run"), 1);
}
