//! Implementation of `quay new`.

use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::core::recipe::{generate_recipe, Recipe, RECIPE_FILE};
use crate::util::fs::{ensure_dir, write_new};

/// Options for scaffolding a recipe.
#[derive(Debug, Clone)]
pub struct NewOptions {
    /// Component name
    pub name: String,

    /// Scaffold into an existing directory
    pub init: bool,
}

/// Scaffold a recipe and a minimal C library source tree.
pub fn new_recipe(path: &Path, opts: &NewOptions) -> Result<()> {
    if path.exists() && !opts.init {
        bail!(
            "destination `{}` already exists\n\
             \n\
             Use `quay new --init` to scaffold into an existing directory.",
            path.display()
        );
    }

    let recipe_path = path.join(RECIPE_FILE);
    if recipe_path.exists() {
        bail!("`{}` already exists in `{}`", RECIPE_FILE, path.display());
    }

    let content = generate_recipe(&opts.name);
    // Refuse names that would not survive a round trip through the parser.
    Recipe::parse(&content, path)
        .with_context(|| format!("`{}` is not a valid component name", opts.name))?;

    let src_dir = path.join("src");
    ensure_dir(&src_dir)?;
    write_new(&recipe_path, &content)
        .with_context(|| format!("failed to write {}", recipe_path.display()))?;

    let guard = format!("{}_H", opts.name.to_uppercase().replace('-', "_"));
    let symbol = opts.name.replace('-', "_");
    create_file(
        &src_dir.join(format!("{}.h", opts.name)),
        &format!(
            "#ifndef {guard}\n#define {guard}\n\n\
             int {symbol}_version(void);\n\n#endif /* {guard} */\n"
        ),
    )?;
    create_file(
        &src_dir.join(format!("{}.c", opts.name)),
        &format!(
            "#include \"{name}.h\"\n\nint {symbol}_version(void) {{\n    return 1;\n}}\n",
            name = opts.name
        ),
    )?;
    create_file(&path.join(".gitignore"), "# Quay build trees\n.quay/\n")?;

    tracing::info!("Created recipe `{}` in {}", opts.name, path.display());
    Ok(())
}

/// Write a scaffold file, keeping any file already at `path`.
fn create_file(path: &Path, contents: &str) -> Result<()> {
    match write_new(path, contents) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            tracing::debug!("keeping existing {}", path.display());
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("failed to write {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_recipe_scaffold() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("zlib-ng");

        let opts = NewOptions {
            name: "zlib-ng".to_string(),
            init: false,
        };
        new_recipe(&dir, &opts).unwrap();

        let recipe = Recipe::load(&dir.join(RECIPE_FILE)).unwrap();
        assert_eq!(recipe.name(), "zlib-ng");
        assert_eq!(recipe.package_info.libs, vec!["zlib-ng"]);

        let header = std::fs::read_to_string(dir.join("src/zlib-ng.h")).unwrap();
        assert!(header.contains("#ifndef ZLIB_NG_H"));
        assert!(header.contains("int zlib_ng_version(void);"));
        assert!(dir.join("src/zlib-ng.c").exists());
    }

    #[test]
    fn test_existing_directory_needs_init() {
        let tmp = TempDir::new().unwrap();
        let opts = NewOptions {
            name: "existing".to_string(),
            init: false,
        };

        let err = new_recipe(tmp.path(), &opts).unwrap_err();
        assert!(err.to_string().contains("already exists"));

        let opts = NewOptions { init: true, ..opts };
        new_recipe(tmp.path(), &opts).unwrap();
        assert!(tmp.path().join(RECIPE_FILE).exists());

        let err = new_recipe(tmp.path(), &opts).unwrap_err();
        assert!(err.to_string().contains("Recipe.toml"));
    }

    #[test]
    fn test_init_keeps_existing_files() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("src")).unwrap();
        std::fs::write(tmp.path().join(".gitignore"), "target/\n").unwrap();
        std::fs::write(tmp.path().join("src/codec.c"), "int main(void) { return 0; }\n").unwrap();

        let opts = NewOptions {
            name: "codec".to_string(),
            init: true,
        };
        new_recipe(tmp.path(), &opts).unwrap();

        assert!(tmp.path().join(RECIPE_FILE).exists());
        assert!(tmp.path().join("src/codec.h").exists());
        assert_eq!(
            std::fs::read_to_string(tmp.path().join(".gitignore")).unwrap(),
            "target/\n"
        );
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("src/codec.c")).unwrap(),
            "int main(void) { return 0; }\n"
        );
    }
}
