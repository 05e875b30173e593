//! # License Stub Module
//!
//! Generates a Python module that carries the project's license text, so a
//! program can print its own copyright notice. The module holds the full
//! notice as `LICENSE` and a `short_license(info, wrap=True, **kwargs)`
//! function returning the short blurb.

use crate::copyright::{AuthorFormat, CopyrightError, CopyrightParams, copyright_string};

/// Comment prefix of the generated module's own copyright block.
const PYTHON_PREFIX: &str = "# ";

/// Escape text for a single-quoted Python string.
///
/// `%` is left alone: the paragraph is formatted with `% info` when
/// `short_license` runs, so a `%%(key)s` in the configuration reaches the
/// module as `%(key)s` and is filled from the caller's mapping.
fn python_single_quoted(text: &str) -> String {
  text.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Escape text for a triple-double-quoted Python string.
fn python_triple_quoted(text: &str) -> String {
  text.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"")
}

/// Render the license module.
///
/// `long` supplies the years, authors, long paragraphs and wrap width;
/// `short` holds the paragraphs of the short blurb.
///
/// # Errors
///
/// Returns a [`CopyrightError`] if either text refers to an unknown
/// placeholder.
pub fn python_module(long: &CopyrightParams<'_>, short: &[String]) -> Result<String, CopyrightError> {
  let header = copyright_string(&long.clone().with_prefix(PYTHON_PREFIX))?;
  let license = copyright_string(&long.clone().with_prefix(""))?;

  let short_params = CopyrightParams {
    text: short,
    ..long.clone()
  }
  .with_prefix("")
  .with_wrap(false)
  .with_author_format(AuthorFormat::Short);
  let short_text = copyright_string(&short_params)?;

  let mut lines = vec![
    header,
    String::new(),
    "import textwrap as _textwrap".to_string(),
    String::new(),
    String::new(),
    "LICENSE = \"\"\"".to_string(),
    python_triple_quoted(&license),
    "\"\"\".strip()".to_string(),
    String::new(),
    "def short_license(info, wrap=True, **kwargs):".to_string(),
    "    paragraphs = [".to_string(),
  ];
  for paragraph in short_text.split("\n\n") {
    lines.push(format!("        '{}' % info,", python_single_quoted(paragraph)));
  }
  lines.extend(
    [
      "        ]",
      "    if wrap:",
      "        for i,p in enumerate(paragraphs):",
      "            paragraphs[i] = _textwrap.fill(p, **kwargs)",
      r"    return '\n\n'.join(paragraphs)",
      "",
    ]
    .map(str::to_string),
  );

  Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::copyright::project_info;

  fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn test_python_module() {
    let authors = strings(&["A <a@a.com>", "B <b@b.edu>"]);
    let long = strings(&["This file is part of %(project)s."]);
    let short = strings(&["%(project)s comes with ABSOLUTELY NO WARRANTY."]);
    let info = project_info("demo", "Git");
    let params = CopyrightParams::new(2005, 2009, &authors, &long, &info);

    let module = python_module(&params, &short).unwrap();

    let expected = concat!(
      "# Copyright (C) 2005-2009 A <a@a.com>\n",
      "#                         B <b@b.edu>\n",
      "#\n",
      "# This file is part of demo.\n",
      "\n",
      "import textwrap as _textwrap\n",
      "\n",
      "\n",
      "LICENSE = \"\"\"\n",
      "Copyright (C) 2005-2009 A <a@a.com>\n",
      "                        B <b@b.edu>\n",
      "\n",
      "This file is part of demo.\n",
      "\"\"\".strip()\n",
      "\n",
      "def short_license(info, wrap=True, **kwargs):\n",
      "    paragraphs = [\n",
      "        'Copyright (C) 2005-2009 A <a@a.com>, B <b@b.edu>' % info,\n",
      "        'demo comes with ABSOLUTELY NO WARRANTY.' % info,\n",
      "        ]\n",
      "    if wrap:\n",
      "        for i,p in enumerate(paragraphs):\n",
      "            paragraphs[i] = _textwrap.fill(p, **kwargs)\n",
      "    return '\\n\\n'.join(paragraphs)\n",
    );
    assert_eq!(module, expected);
  }

  #[test]
  fn test_python_module_escapes_quotes() {
    let authors = strings(&["O'Brien"]);
    let short = strings(&["It's free, see C:\\licenses."]);
    let info = project_info("demo", "Git");
    let params = CopyrightParams::new(2010, 2010, &authors, &[], &info);

    let module = python_module(&params, &short).unwrap();

    assert!(module.contains("        'Copyright (C) 2010 O\\'Brien' % info,\n"));
    assert!(module.contains("        'It\\'s free, see C:\\\\licenses.' % info,\n"));
  }

  #[test]
  fn test_python_module_keeps_runtime_placeholders() {
    let authors = strings(&["A"]);
    let short = strings(&["%%(program)s is part of %(project)s."]);
    let info = project_info("demo", "Git");
    let params = CopyrightParams::new(2010, 2012, &authors, &[], &info);

    let module = python_module(&params, &short).unwrap();

    assert!(module.contains("        '%(program)s is part of demo.' % info,\n"));
  }

  #[test]
  fn test_python_module_missing_key() {
    let authors = strings(&["A"]);
    let short = strings(&["%(nope)s"]);
    let info = project_info("demo", "Git");
    let params = CopyrightParams::new(2010, 2010, &authors, &[], &info);

    assert!(matches!(
      python_module(&params, &short),
      Err(CopyrightError::MissingKey { .. })
    ));
  }
}
