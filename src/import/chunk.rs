//! Record-aligned chunking of serialized NDJSON payloads.

/// Splits NDJSON bytes into chunks of at most `chunk_size` bytes without
/// ever splitting a line. A single line longer than `chunk_size` becomes
/// a chunk of its own; record integrity outranks the size cap.
pub fn split_on_record_boundaries(bytes: &[u8], chunk_size: usize) -> Vec<Vec<u8>> {
    let mut chunks: Vec<Vec<u8>> = Vec::new();
    let mut current: Vec<u8> = Vec::new();

    let mut start = 0;
    while start < bytes.len() {
        let end = match bytes[start..].iter().position(|&byte| byte == b'\n') {
            Some(offset) => start + offset + 1,
            None => bytes.len(),
        };
        let line = &bytes[start..end];
        start = end;

        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        if !current.is_empty() && current.len() + line.len() > chunk_size {
            chunks.push(std::mem::take(&mut current));
        }
        current.extend_from_slice(line);
        if current.len() >= chunk_size {
            chunks.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
