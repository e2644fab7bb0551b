//! Header discovery through `cl.exe /showIncludes`.

use compdb_cache::Resolution;
use compdb_common::{ActionResult, CompileAction, HeaderSet};
use compdb_toolchain::Invocation;

use super::{report_compiler_output, HeaderContext};

/// How `cl.exe` introduces an included file, in each language it ships in.
///
/// The marker depends on the host locale, and an English language pack
/// can't be assumed, so every known variant is accepted.
const INCLUDE_MARKERS: [&str; 14] = [
    "Note: including file:",
    "注意: 包含文件: ",
    "注意: 包含檔案:",
    "Poznámka: Včetně souboru:",
    "Hinweis: Einlesen der Datei:",
    "Remarque : inclusion du fichier : ",
    "Nota: file incluso ",
    "メモ: インクルード ファイル: ",
    "참고: 포함 파일:",
    "Uwaga: w tym pliku: ",
    "Observação: incluindo arquivo:",
    "Примечание: включение файла: ",
    "Not: eklenen dosya: ",
    "Nota: inclusión del archivo:",
];

/// `cl.exe`'s "cannot open include file" error.
const FILE_NOT_FOUND: &str = "C1083";

const INCLUDE_SEPARATOR: &str = if cfg!(windows) { ";" } else { ":" };

/// Headers and leftover output from `/showIncludes` stderr.
fn parse_show_includes(stderr: &str, source: &str) -> (HeaderSet, Vec<String>) {
    let mut headers = HeaderSet::new();
    let mut other = Vec::new();
    for line in stderr.lines() {
        // cl.exe echoes the name of the file it compiles.
        if line == source || source.ends_with(&format!("/{line}")) {
            continue;
        }
        match INCLUDE_MARKERS
            .iter()
            .find_map(|marker| line.strip_prefix(marker))
        {
            Some(header) => {
                headers.insert(header.trim().to_string());
            }
            None => other.push(line.to_string()),
        }
    }
    (headers, other)
}

/// Preprocesses with `/showIncludes` and collects the headers it names.
///
/// Bazel doesn't record `INCLUDE` for actions, so it's filled in from the
/// configured default include paths. A "cannot open include file" error
/// means the list stopped early, so the result is then partial.
pub fn resolve(action: &CompileAction, source: &str, ctx: &HeaderContext<'_>) -> ActionResult<Resolution> {
    let mut command = action.arguments.clone();
    command.extend(["/showIncludes".to_string(), "/EP".to_string()]);
    let invocation = Invocation::new(command)
        .envs(&action.environment_variables)
        .env("INCLUDE", ctx.msvc_include_paths.join(INCLUDE_SEPARATOR))
        .current_dir(ctx.root)
        .discard_stdout();
    let output = ctx.runner.run(&invocation)?;

    let (headers, other) = parse_show_includes(&output.stderr, source);
    if other.is_empty() {
        return Ok(Resolution::complete(headers));
    }
    let truncated = other.iter().any(|line| line.contains(FILE_NOT_FOUND));
    report_compiler_output(ctx.sink, source, other.join("\n"));
    Ok(if truncated {
        Resolution::partial(headers)
    } else {
        Resolution::complete(headers)
    })
}
