//! The pretty print implementation of the [`ChipSet`](super::ChipSet), used for the state
//! dump after a fatal error.
//! This implementation was split up into this file for smaller file sizes and higher
//! cohesion.

use std::fmt::{self, Write};

use once_cell::sync::Lazy;

use super::ChipSet;
use crate::{
    definitions::cpu,
    devices::{DisplayCommands, KeyboardCommands, SoundCommands},
};

/// The amount of values in a single row, has to be bigger than 2.
const HEX_PRINT_STEP: usize = 8;

const END_OF_LINE: char = '\n';
const INDENT_FILLAMENT: char = '\t';
const INDENT_SIZE: usize = 2;

/// The formatted integer is 2 symbols for the prefix (0x)
/// and 4 for the rest long.
macro_rules! intformat {
    () => {
        "{:#06X}"
    };
}

/// Will add an indent post processing
fn indent_helper(text: &mut String, indent: usize) {
    for _ in 0..indent {
        text.push(INDENT_FILLAMENT);
    }
}

/// Will indent a single value line.
fn indented<T: fmt::Display>(value: T) -> String {
    let mut line = String::new();
    indent_helper(&mut line, INDENT_SIZE);
    line.push_str(&value.to_string());
    line
}

static INTEGER_LEN: Lazy<usize> = Lazy::new(|| format!(intformat!(), 0u8).len());

static POINTER_LEN: Lazy<usize> =
    Lazy::new(|| format!(concat!(intformat!(), " - ", intformat!(), " :"), 0, 0).len());

/// a line length (This is a bit bigger than the actual line will be)
static LENLINE: Lazy<usize> =
    Lazy::new(|| INDENT_SIZE + HEX_PRINT_STEP * (*INTEGER_LEN + 1) + 1 + *POINTER_LEN);

/// Handles all the printing of the pointer values.
mod pointer_print {
    use std::fmt::Write;

    /// will format the pointers according to definition
    pub(super) fn formatter(line: &mut String, from: usize, to: usize) -> std::fmt::Result {
        write!(
            line,
            concat!(intformat!(), " - ", intformat!(), " :"),
            from, to
        )
    }
}

/// handles printing of any and all of integers.
mod integer_print {
    use super::{pointer_print, END_OF_LINE, HEX_PRINT_STEP};
    use num_traits::Unsigned;
    use std::fmt::{self, Write};

    /// will format all integer types
    pub(super) fn formatter<T>(line: &mut String, data: T) -> fmt::Result
    where
        T: fmt::UpperHex + Unsigned + Copy,
    {
        write!(line, intformat!(), data)
    }

    /// will pretty print all the integer data given
    pub(super) fn printer<T>(data: &[T], indent: usize) -> Result<String, fmt::Error>
    where
        T: fmt::UpperHex + Unsigned + Copy,
    {
        let mut res = String::with_capacity(*super::LENLINE * (data.len() / HEX_PRINT_STEP + 1));

        for (row, chunk) in data.chunks(HEX_PRINT_STEP).enumerate() {
            let from = row * HEX_PRINT_STEP;
            super::indent_helper(&mut res, indent);
            pointer_print::formatter(&mut res, from, from + chunk.len() - 1)?;

            for entry in chunk {
                res.push(' ');
                formatter(&mut res, *entry)?;
            }
            res.push(END_OF_LINE);
        }

        // Remove unneeded new line
        if res.ends_with(END_OF_LINE) {
            res.pop();
        }
        Ok(res)
    }
}

/// Handles all the opcode prints
mod opcode_print {
    use super::{integer_print, pointer_print, END_OF_LINE, HEX_PRINT_STEP};
    use crate::{definitions::memory, opcode::Opcode};
    use once_cell::sync::Lazy;
    use std::fmt::{self, Write};

    /// The internal length of the given data
    /// as the data is stored as u8 and an opcode
    /// is u16 long
    const POINTER_INCREMENT: usize = HEX_PRINT_STEP * memory::opcodes::SIZE;
    /// The values that are used when there are at lease two rows of zeros.
    const FILLER_BASE: &str = "...";

    /// Prepares the line that will be used, in the case that there is at least two lines
    /// of only zeros.
    static ZERO_FILLER: Lazy<String> = Lazy::new(|| {
        let formatted = format!(intformat!(), 0u16);
        let length = formatted.len() * (HEX_PRINT_STEP - 2) + (HEX_PRINT_STEP - 1)
            - FILLER_BASE.len();
        let filler = " ".repeat(length / 2);
        format!(
            "{}{}{}{}{}",
            formatted, filler, FILLER_BASE, filler, formatted
        )
    });

    /// this struct will simulate a single row of opcodes (only in this context)
    struct Row {
        from: usize,
        to: usize,
        data: Vec<Opcode>,
        only_null: bool,
    }

    /// using the fmt::Display` for simple printing of the data later on
    impl fmt::Display for Row {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let mut res = String::with_capacity(*super::LENLINE);
            pointer_print::formatter(&mut res, self.from, self.to)?;
            res.push(' ');

            if self.only_null {
                res.push_str(&ZERO_FILLER);
            } else {
                let mut entries = self.data.iter();
                if let Some(first) = entries.next() {
                    integer_print::formatter(&mut res, *first)?;
                }
                for entry in entries {
                    res.push(' ');
                    integer_print::formatter(&mut res, *entry)?;
                }
            }
            write!(f, "{}", res)
        }
    }

    /// will pretty print the content of the raw memory
    /// this functions assumes the full data to be passed
    /// as the offset is calculated from the beginning of the
    /// memory block
    pub(super) fn printer(memory: &[u8], indent: usize) -> Result<String, fmt::Error> {
        let mut rows: Vec<Row> = Vec::with_capacity(memory.len() / POINTER_INCREMENT + 1);

        for (index, chunk) in memory.chunks(POINTER_INCREMENT).enumerate() {
            let from = index * POINTER_INCREMENT;
            let to = from + chunk.len() - 1;

            let data: Vec<Opcode> = chunk
                .chunks(memory::opcodes::SIZE)
                .map(|pair| match *pair {
                    [high, low] => Opcode::from_be_bytes([high, low]),
                    [high] => Opcode::from_be_bytes([high, 0]),
                    _ => 0,
                })
                .collect();
            let only_null = data.iter().all(|&opcode| opcode == 0);

            let mut row = Row {
                from,
                to,
                data,
                only_null,
            };

            // merge runs of zero rows
            if only_null {
                if let Some(last_row) = rows.last() {
                    if last_row.only_null {
                        row.from = last_row.from;
                        rows.pop();
                    }
                }
            }
            rows.push(row)
        }

        let mut string = String::with_capacity((*super::LENLINE + 1) * rows.len());
        for row in rows {
            super::indent_helper(&mut string, indent);
            write!(string, "{}{}", row, END_OF_LINE)?;
        }
        if string.ends_with(END_OF_LINE) {
            string.pop();
        }
        Ok(string)
    }
}

/// Handles all the boolean data types.
mod bool_print {
    use super::{pointer_print, END_OF_LINE, HEX_PRINT_STEP};
    use once_cell::sync::Lazy;

    /// the prepared true string
    static TRUE: Lazy<String> = Lazy::new(|| formatter("true"));
    /// the prepared false string
    static FALSE: Lazy<String> = Lazy::new(|| formatter("false"));

    /// a function to keep the correct format length
    fn formatter(message: &str) -> String {
        format!("{:<width$}", message, width = *super::INTEGER_LEN)
    }

    /// will pretty print all the boolean data given
    /// the offset will be calculated automatically from
    /// the data block
    pub(super) fn printer(data: &[bool], indent: usize) -> Result<String, std::fmt::Error> {
        let mut res = String::with_capacity(*super::LENLINE * (data.len() / HEX_PRINT_STEP + 1));

        let check_type = |val: bool| if val { &*TRUE } else { &*FALSE };

        for (row, chunk) in data.chunks(HEX_PRINT_STEP).enumerate() {
            let from = row * HEX_PRINT_STEP;
            super::indent_helper(&mut res, indent);
            pointer_print::formatter(&mut res, from, from + chunk.len() - 1)?;

            for value in chunk {
                res.push(' ');
                res.push_str(check_type(*value));
            }
            // the last entry does not need the padding
            let trimmed = res.trim_end().len();
            res.truncate(trimmed);
            res.push(END_OF_LINE);
        }
        // Remove unneeded new line
        if res.ends_with(END_OF_LINE) {
            res.pop();
        }

        Ok(res)
    }
}

impl<D, K, S> fmt::Display for ChipSet<D, K, S>
where
    D: DisplayCommands,
    K: KeyboardCommands,
    S: SoundCommands,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let nam = indented(&self.name);

        let mut opc = String::with_capacity(*INTEGER_LEN + INDENT_SIZE);
        indent_helper(&mut opc, INDENT_SIZE);
        integer_print::formatter(&mut opc, self.opcode)?;

        let mut prc = String::with_capacity(*INTEGER_LEN + INDENT_SIZE);
        indent_helper(&mut prc, INDENT_SIZE);
        integer_print::formatter(&mut prc, self.registers.program_counter())?;

        let mut idx = String::with_capacity(*INTEGER_LEN + INDENT_SIZE);
        indent_helper(&mut idx, INDENT_SIZE);
        integer_print::formatter(&mut idx, self.registers.index())?;

        let mut del = String::with_capacity(*INTEGER_LEN + INDENT_SIZE);
        indent_helper(&mut del, INDENT_SIZE);
        integer_print::formatter(&mut del, self.get_delay_timer())?;

        let mut snd = String::with_capacity(*INTEGER_LEN + INDENT_SIZE);
        indent_helper(&mut snd, INDENT_SIZE);
        integer_print::formatter(&mut snd, self.get_sound_timer())?;

        let mem = opcode_print::printer(self.memory.as_slice(), INDENT_SIZE)?;
        let key = bool_print::printer(self.keyboard.get_keys(), INDENT_SIZE)?;

        // handle stack specially as it needs to be filled up if empty
        let mut stack = [0; cpu::stack::SIZE];
        let frames = self.stack.frames();
        stack[..frames.len()].copy_from_slice(frames);
        let sta = integer_print::printer(&stack, INDENT_SIZE)?;

        let reg = integer_print::printer(self.registers.all(), INDENT_SIZE)?;

        write!(
            f,
            "Chipset {{\n\
                \tProgram Name :\n{}\n\
                \tOpcode :\n{}\n\
                \tProgram Counter :\n{}\n\
                \tIndex Register :\n{}\n\
                \tDelay Timer :\n{}\n\
                \tSound Timer :\n{}\n\
                \tMemory :\n{}\n\
                \tKeyboard :\n{}\n\
                \tStack :\n{}\n\
                \tRegister :\n{}\n\
                }}",
            nam, opc, prc, idx, del, snd, mem, key, sta, reg
        )
    }
}
