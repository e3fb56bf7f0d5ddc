use std::path::PathBuf;

use anyhow::{Result, bail};

/// Commande interactive, une par ligne.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `load <path>`: remplace l'image courante.
    Load(PathBuf),
    /// `res <n>`: nombre de colonnes.
    Resolution(u32),
    /// `add <arg>`: ajoute au charset.
    Add(String),
    /// `rm <arg>`: retire du charset.
    Remove(String),
    /// `charset`: liste le charset.
    Charset,
    /// `preset <name>`: remplace le charset par un preset.
    Preset(String),
    /// `invert`: bascule l'inversion.
    Invert,
    /// `show`: affiche la conversion.
    Show,
    /// `save <path>`: export texte.
    Save(PathBuf),
    /// `html <path>`: export HTML.
    Html(PathBuf),
    /// `info`: état de la session.
    Info,
    /// `help`
    Help,
    /// `quit`
    Quit,
}

/// Aide affichée par `help`.
pub const HELP: &str = "\
commandes :
  load <chemin>      charger une image (PNG, JPEG, BMP, GIF)
  res <n>            colonnes : puissance de deux <= largeur paddée
  add <arg>          ajouter : caractère, a-z, U+0041-U+005A, all, space
  rm <arg>           retirer (même syntaxe)
  charset            lister le charset
  preset <nom>       compact, standard, minimal, digital
  invert             inverser la luminance
  show               afficher la conversion
  save <chemin>      exporter en texte
  html <chemin>      exporter en HTML
  info               état de la session
  quit               quitter";

/// Parse one input line. Blank lines and `#` comments yield `None`.
///
/// # Errors
/// Returns an error for unknown commands or missing/invalid arguments.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (word, arg) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let required = |name: &str| -> Result<String> {
        if arg.is_empty() {
            bail!("`{name}` attend un argument");
        }
        Ok(arg.to_string())
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "load" | "open" => Command::Load(PathBuf::from(required("load")?)),
        "res" | "resolution" => {
            let raw = required("res")?;
            let Ok(n) = raw.parse::<u32>() else {
                bail!("résolution non entière : {raw}");
            };
            Command::Resolution(n)
        }
        "add" => Command::Add(required("add")?),
        "rm" | "remove" => Command::Remove(required("rm")?),
        "charset" => Command::Charset,
        "preset" => Command::Preset(required("preset")?),
        "invert" => Command::Invert,
        "show" | "print" => Command::Show,
        "save" => Command::Save(PathBuf::from(required("save")?)),
        "html" => Command::Html(PathBuf::from(required("html")?)),
        "info" => Command::Info,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => bail!("commande inconnue : {other} (tapez `help`)"),
    };
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_command() {
        let cases = [
            ("load img/cat.png", Command::Load("img/cat.png".into())),
            ("res 32", Command::Resolution(32)),
            ("add a-z", Command::Add("a-z".into())),
            ("rm   space  ", Command::Remove("space".into())),
            ("charset", Command::Charset),
            ("preset digital", Command::Preset("digital".into())),
            ("invert", Command::Invert),
            ("SHOW", Command::Show),
            ("save out.txt", Command::Save("out.txt".into())),
            ("html out.html", Command::Html("out.html".into())),
            ("info", Command::Info),
            ("help", Command::Help),
            ("exit", Command::Quit),
        ];
        for (line, expected) in cases {
            assert_eq!(parse_command(line).unwrap(), Some(expected), "{line}");
        }
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(parse_command("   ").unwrap(), None);
        assert_eq!(parse_command("# commentaire").unwrap(), None);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_command("res").is_err());
        assert!(parse_command("res -4").is_err());
        assert!(parse_command("res huit").is_err());
        assert!(parse_command("add").is_err());
        assert!(parse_command("dance").is_err());
    }
}
