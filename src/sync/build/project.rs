//! Project config scaffolding (e.g. `tsconfig.json`).

use crate::config::Scaffold;
use serde_json::json;
use std::path::Path;

/// Render the default config for `scaffold`.
///
/// `build_output` is relative to the source root, which is also the
/// compiler's root directory, or absolute when it lies elsewhere.
pub fn render(scaffold: Scaffold, build_output: &Path) -> String {
    match scaffold {
        Scaffold::Tsconfig => tsconfig(build_output),
    }
}

fn tsconfig(build_output: &Path) -> String {
    let out_dir = build_output.to_string_lossy().replace('\\', "/");
    let out_dir_option = if build_output.is_absolute() {
        out_dir.clone()
    } else {
        format!("./{out_dir}")
    };
    let value = json!({
        "compilerOptions": {
            "target": "ES2018",
            "module": "commonjs",
            "outDir": out_dir_option,
            "rootDir": ".",
            "strict": true,
            "esModuleInterop": true,
            "skipLibCheck": true,
            "forceConsistentCasingInFileNames": true,
            "declaration": false,
            "sourceMap": false
        },
        "include": ["**/*"],
        "exclude": ["node_modules", out_dir]
    });

    // json! values always serialize
    let mut text = serde_json::to_string_pretty(&value).unwrap_or_default();
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tsconfig_defaults() {
        let text = render(Scaffold::Tsconfig, Path::new("dist"));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let options = &value["compilerOptions"];

        assert_eq!(options["target"], "ES2018");
        assert_eq!(options["module"], "commonjs");
        assert_eq!(options["outDir"], "./dist");
        assert_eq!(options["rootDir"], ".");
        assert_eq!(options["strict"], true);
        assert_eq!(options["sourceMap"], false);
        assert_eq!(value["exclude"], json!(["node_modules", "dist"]));
    }

    #[test]
    fn test_tsconfig_keeps_key_order() {
        let text = render(Scaffold::Tsconfig, Path::new("build/js"));
        let target = text.find("\"target\"").unwrap();
        let out_dir = text.find("\"outDir\"").unwrap();
        assert!(target < out_dir);
        assert!(text.contains("./build/js"));
    }
}
