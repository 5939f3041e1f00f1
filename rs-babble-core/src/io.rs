use std::path::{Path, PathBuf};
use std::{env, fs, io};

/// Reads a whole UTF-8 text file.
///
/// Invalid UTF-8 sequences are replaced rather than rejected, since books
/// from the wild are not always clean.
pub fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<String> {
	let bytes = fs::read(filename)?;
	Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/books` + `"bin"` → `data/books.bin`
pub fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists all files with a given extension in a directory.
///
/// Returns full paths, sorted so that training order is stable.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<PathBuf>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			files.push(path);
		}
	}

	files.sort();
	Ok(files)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn output_path_replaces_extension() {
		let path = build_output_path("data/books", "bin").unwrap();
		assert_eq!(path, PathBuf::from("data/books.bin"));
		let path = build_output_path("data/book.txt", "bin").unwrap();
		assert_eq!(path, PathBuf::from("data/book.bin"));
	}

	#[test]
	fn lists_only_matching_files_sorted() {
		let dir = tempfile::tempdir().unwrap();
		for name in ["b.txt", "a.txt", "c.md"] {
			fs::write(dir.path().join(name), "text").unwrap();
		}
		fs::create_dir(dir.path().join("d.txt")).unwrap();

		let files = list_files(dir.path(), "txt").unwrap();
		let names: Vec<_> = files.iter().map(|p| p.file_name().unwrap().to_string_lossy().into_owned()).collect();
		assert_eq!(names, vec!["a.txt", "b.txt"]);
	}

	#[test]
	fn reads_invalid_utf8_lossily() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("book.txt");
		fs::write(&path, b"caf\xff ok").unwrap();
		assert_eq!(read_file(&path).unwrap(), "caf\u{fffd} ok");
	}
}
