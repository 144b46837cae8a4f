/// Global stylesheet given to new documents.
///
/// Declarations apply to the document root; nested rules (like the flow
/// spacing below) rely on the root rule being rendered as nested CSS.
pub const DEFAULT_GLOBAL_STYLE: &str = "\
--size-step-0: 11pt;
--size-step-1: 12.5pt;
--size-step-2: 14pt;
--size-step-3: 16pt;

margin: 10mm;
/* flow spacing between siblings */
* + * {
\tmargin-top: 1.5em;
}
";
