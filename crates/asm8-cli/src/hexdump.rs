//! Hexdump rendering for flat binaries.

/// Bytes shown per row.
pub const BYTES_PER_ROW: usize = 8;

/// Renders `binary` as rows of `OFFSET:  HH HH ..  ascii`.
///
/// Offsets are upper-case hex, zero-padded to the width of the binary's
/// length. A run of all-zero rows is collapsed into one `[zeros]` line and the
/// dump ends with a `LEN:  [end of binary]` line.
pub fn hexdump(binary: &[u8]) -> String {
    let width = format!("{:x}", binary.len()).len();
    let hex_width = 3 * BYTES_PER_ROW - 1;
    let mut out = String::new();
    let mut in_zeros = false;

    for (row, chunk) in binary.chunks(BYTES_PER_ROW).enumerate() {
        if chunk.iter().all(|&b| b == 0) {
            if !in_zeros {
                out.push_str(&format!("{}.  [zeros]\n", ".".repeat(width)));
            }
            in_zeros = true;
            continue;
        }
        in_zeros = false;

        let hex = chunk
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ");
        let ascii: String = chunk
            .iter()
            .map(|&b| if (32..128).contains(&b) { b as char } else { '.' })
            .collect();
        let offset = row * BYTES_PER_ROW;
        out.push_str(&format!("{offset:0width$X}:  {hex:hex_width$}  {ascii}\n"));
    }

    out.push_str(&format!("{:0width$X}:  [end of binary]\n", binary.len()));
    out
}
