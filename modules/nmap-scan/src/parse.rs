/// Count non-overlapping, case-sensitive occurrences of `open` in scanner output.
///
/// This is a heuristic over the raw text, not a parse of nmap's report. Any
/// incidental match counts too, so the summary line `Nmap done: 1 open port`
/// adds one to the total.
pub fn count_open(text: &str) -> u64 {
    text.matches("open").count() as u64
}
