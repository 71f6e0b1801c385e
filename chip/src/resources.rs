use std::path::Path;

use crate::SetupError;

#[derive(Clone, PartialEq, Eq)]
/// Represents a single rom with it's information
pub struct Rom {
    /// The rom name
    name: String,
    /// The raw program, no header
    /// stored as a u8 slice on the heap
    data: Box<[u8]>,
}

impl Rom {
    /// Will generate a new rom based of the given data
    ///
    /// There might be a case where there is an uneven amount of
    /// data entries, a zero byte is appended so that the last opcode
    /// is complete.
    pub fn new<D>(name: &str, data: D) -> Self
    where
        D: Into<Vec<u8>>,
    {
        let mut data = data.into();
        if data.len() % 2 != 0 {
            data.push(0);
        }
        Rom {
            name: name.to_string(),
            data: data.into_boxed_slice(),
        }
    }

    /// Will read the rom from the file system, the file name is used as the rom name.
    pub fn from_file<P>(path: P) -> Result<Self, SetupError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| SetupError::RomUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let name = path
            .file_stem()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        log::debug!("read rom '{}' ({} bytes)", name, data.len());
        Ok(Self::new(&name, data))
    }

    /// Will return a slice internal values of the given data
    pub fn get_data(&self) -> &[u8] {
        &self.data
    }

    /// Will return the name of the rom.
    pub fn get_name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for Rom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rom")
            .field("name", &self.name)
            .field("len", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::{build_opcode, Opcode};

    const RAW_ROM_DATA: [Opcode; 6] = [0x00E0, 0x6C00, 0x4C00, 0x6E0F, 0xA203, 0x6020];

    #[test]
    fn test_rom_opcodes() {
        let bytes: Vec<u8> = RAW_ROM_DATA.iter().flat_map(|op| op.to_be_bytes()).collect();
        let rom = Rom::new("TEST", bytes);
        let data = rom.get_data();

        for i in (0..data.len()).step_by(2) {
            let opcode = build_opcode(data, i).unwrap();
            assert_eq!(RAW_ROM_DATA[i / 2], opcode);
        }
        assert_eq!("TEST", rom.get_name());
    }

    #[test]
    fn test_odd_rom_is_padded() {
        let rom = Rom::new("ODD", vec![0x12, 0x00, 0x60]);
        assert_eq!(&[0x12u8, 0x00, 0x60, 0x00][..], rom.get_data());
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("chip8-rom-test-{}.ch8", std::process::id()));
        std::fs::write(&path, [0x12u8, 0x00]).unwrap();

        let rom = Rom::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(&[0x12u8, 0x00][..], rom.get_data());
        assert!(rom.get_name().starts_with("chip8-rom-test-"));
    }

    #[test]
    fn test_from_missing_file() {
        let path = std::env::temp_dir().join("chip8-this-rom-does-not-exist.ch8");
        match Rom::from_file(&path) {
            Err(SetupError::RomUnreadable { path: reported, .. }) => assert_eq!(path, reported),
            other => panic!("unexpected {:?}", other.map(|rom| rom.get_name().to_string())),
        }
    }
}
