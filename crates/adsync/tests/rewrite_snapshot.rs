use adsync::app::config_edit::ConfigDocument;
use adsync::app::replace::generated_module_source;
use insta::assert_snapshot;
use serde_json::json;

#[test]
fn generated_module_text_is_stable() {
    let source = generated_module_source("buttonPNG", "image/png", b"hello world");
    assert_snapshot!(source, @r#"export const buttonPNG = "data:image/png;base64,aGVsbG8gd29ybGQ=";"#);
}

#[test]
fn config_rewrite_is_stable() {
    let original = concat!(
        "// Ad network wiring lives here.\n",
        "export const GAME_CONFIG = {\n",
        "  adNetworkType: 'google',\n",
        "  scale: { width: 960, height: 640 },\n",
        "  networks: ['google', 'meta'],\n",
        "};\n",
        "startGame(GAME_CONFIG);\n"
    );
    let mut document = ConfigDocument::parse(original).unwrap();
    document.set_path("adNetworkType", json!("meta")).unwrap();

    let rendered = document.render();
    assert!(rendered.ends_with("startGame(GAME_CONFIG);\n"));
    assert_snapshot!(rendered.trim_end(), @r#"
    // Ad network wiring lives here.
    export const GAME_CONFIG = {
      "adNetworkType": "meta",
      "scale": {
        "width": 960,
        "height": 640
      },
      "networks": [
        "google",
        "meta"
      ]
    };
    startGame(GAME_CONFIG);
    "#);
}
