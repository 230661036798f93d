//! Field and method descriptors.
//!
//! Descriptors are kept as strings on every member (they are compared verbatim during lookup);
//! this module provides the structured view the resolver needs on top of that:
//!
//! - [`BasicType`] classification of every component, used for field layout and
//!   [`crate::link::FieldAccessInfo`]
//! - [`referenced_class_names`], the reference types a signature mentions, which is the input of
//!   the loader-constraint check
//! - [`basic_type_signature`], the erased form of a signature used to select method-handle
//!   intrinsics
//!
//! # Examples
//!
//! ```rust
//! use vmlink::metadata::signatures::{basic_type_signature, referenced_class_names};
//!
//! let sig = "(Ljava/lang/String;[Lcom/acme/Foo;Z)[I";
//! assert_eq!(
//!     referenced_class_names(sig)?,
//!     vec!["java/lang/String", "com/acme/Foo"]
//! );
//! assert_eq!(
//!     basic_type_signature(sig, false)?,
//!     "(Ljava/lang/Object;Ljava/lang/Object;I)Ljava/lang/Object;"
//! );
//! # Ok::<(), vmlink::Error>(())
//! ```

use strum::{Display, EnumIter};

use crate::{metadata::symbols::OBJECT, Result};

/// The basic (erased) type of a signature component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum BasicType {
    /// `Z`
    #[strum(serialize = "boolean")]
    Boolean,
    /// `C`
    #[strum(serialize = "char")]
    Char,
    /// `F`
    #[strum(serialize = "float")]
    Float,
    /// `D`
    #[strum(serialize = "double")]
    Double,
    /// `B`
    #[strum(serialize = "byte")]
    Byte,
    /// `S`
    #[strum(serialize = "short")]
    Short,
    /// `I`
    #[strum(serialize = "int")]
    Int,
    /// `J`
    #[strum(serialize = "long")]
    Long,
    /// `L<name>;`
    #[strum(serialize = "object")]
    Object,
    /// `[<component>`
    #[strum(serialize = "array")]
    Array,
    /// `V`, only valid as return type
    #[strum(serialize = "void")]
    Void,
}

impl BasicType {
    /// Maps the leading character of a descriptor component to its basic type
    #[must_use]
    pub fn from_descriptor_char(c: u8) -> Option<Self> {
        match c {
            b'Z' => Some(BasicType::Boolean),
            b'C' => Some(BasicType::Char),
            b'F' => Some(BasicType::Float),
            b'D' => Some(BasicType::Double),
            b'B' => Some(BasicType::Byte),
            b'S' => Some(BasicType::Short),
            b'I' => Some(BasicType::Int),
            b'J' => Some(BasicType::Long),
            b'L' => Some(BasicType::Object),
            b'[' => Some(BasicType::Array),
            b'V' => Some(BasicType::Void),
            _ => None,
        }
    }

    /// The descriptor character of a primitive type; references map to `L`
    #[must_use]
    pub fn descriptor_char(&self) -> char {
        match self {
            BasicType::Boolean => 'Z',
            BasicType::Char => 'C',
            BasicType::Float => 'F',
            BasicType::Double => 'D',
            BasicType::Byte => 'B',
            BasicType::Short => 'S',
            BasicType::Int => 'I',
            BasicType::Long => 'J',
            BasicType::Object | BasicType::Array => 'L',
            BasicType::Void => 'V',
        }
    }

    /// Size of a value of this type in a field slot
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        match self {
            BasicType::Boolean | BasicType::Byte => 1,
            BasicType::Char | BasicType::Short => 2,
            BasicType::Float | BasicType::Int => 4,
            BasicType::Double | BasicType::Long | BasicType::Object | BasicType::Array => 8,
            BasicType::Void => 0,
        }
    }

    /// Returns `true` for object and array types
    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(self, BasicType::Object | BasicType::Array)
    }

    /// Returns `true` for the integral types narrower than `int`
    #[must_use]
    pub fn is_subword(&self) -> bool {
        matches!(
            self,
            BasicType::Boolean | BasicType::Byte | BasicType::Char | BasicType::Short
        )
    }
}

/// One component of a descriptor: a field type, a parameter or a return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureType<'a> {
    /// Basic type of the component
    pub basic: BasicType,
    /// The component's complete descriptor text, e.g. `[Ljava/lang/String;`
    pub text: &'a str,
}

impl<'a> SignatureType<'a> {
    /// The class named by this component: the class itself for `L` types, the bottom element
    /// class for arrays of references, nothing for primitives and primitive arrays
    #[must_use]
    pub fn class_name(&self) -> Option<&'a str> {
        let element = self.text.trim_start_matches('[');
        element
            .strip_prefix('L')
            .and_then(|rest| rest.strip_suffix(';'))
    }
}

/// Parsed view of a method descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature<'a> {
    /// Parameter types in declaration order
    pub params: Vec<SignatureType<'a>>,
    /// Return type
    pub ret: SignatureType<'a>,
}

/// Parses one component starting at `start`, returning it and the position after it.
fn parse_component(sig: &str, start: usize, allow_void: bool) -> Result<(SignatureType<'_>, usize)> {
    let bytes = sig.as_bytes();
    let mut pos = start;
    while pos < bytes.len() && bytes[pos] == b'[' {
        pos += 1;
    }
    let Some(&lead) = bytes.get(pos) else {
        return Err(malformed_error!("Truncated descriptor - {}", sig));
    };
    let Some(element) = BasicType::from_descriptor_char(lead) else {
        return Err(malformed_error!(
            "Invalid descriptor character '{}' in {}",
            lead as char,
            sig
        ));
    };

    let end = match element {
        BasicType::Object => match sig[pos..].find(';') {
            Some(offset) if offset > 1 => pos + offset + 1,
            _ => return Err(malformed_error!("Unterminated class name in {}", sig)),
        },
        BasicType::Void if pos != start || !allow_void => {
            return Err(malformed_error!("Misplaced void in {}", sig));
        }
        _ => pos + 1,
    };

    let basic = if pos > start { BasicType::Array } else { element };
    Ok((
        SignatureType {
            basic,
            text: &sig[start..end],
        },
        end,
    ))
}

/// Parses a field descriptor such as `Ljava/lang/String;` or `[J`.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if the descriptor is invalid or has trailing characters.
pub fn parse_field(sig: &str) -> Result<SignatureType<'_>> {
    let (component, end) = parse_component(sig, 0, false)?;
    if end != sig.len() {
        return Err(malformed_error!("Trailing characters in field descriptor {}", sig));
    }
    Ok(component)
}

/// Parses a method descriptor such as `(ILjava/lang/Object;)V`.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if the descriptor is invalid.
pub fn parse_method(sig: &str) -> Result<MethodSignature<'_>> {
    if !sig.starts_with('(') {
        return Err(malformed_error!("Method descriptor must start with '(' - {}", sig));
    }

    let mut params = Vec::new();
    let mut pos = 1;
    loop {
        match sig.as_bytes().get(pos) {
            Some(b')') => break,
            Some(_) => {
                let (param, next) = parse_component(sig, pos, false)?;
                params.push(param);
                pos = next;
            }
            None => return Err(malformed_error!("Unterminated parameter list - {}", sig)),
        }
    }

    let (ret, end) = parse_component(sig, pos + 1, true)?;
    if end != sig.len() {
        return Err(malformed_error!("Trailing characters in method descriptor {}", sig));
    }
    Ok(MethodSignature { params, ret })
}

/// Returns `true` if the descriptor is a method descriptor.
#[must_use]
pub fn is_method_signature(sig: &str) -> bool {
    sig.starts_with('(')
}

/// Class names mentioned by a field or method descriptor, in order of appearance.
///
/// Array types contribute their bottom element class, primitive arrays contribute nothing.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if the descriptor is invalid.
pub fn referenced_class_names(sig: &str) -> Result<Vec<&str>> {
    if is_method_signature(sig) {
        let parsed = parse_method(sig)?;
        Ok(parsed
            .params
            .iter()
            .chain(std::iter::once(&parsed.ret))
            .filter_map(SignatureType::class_name)
            .collect())
    } else {
        Ok(parse_field(sig)?.class_name().into_iter().collect())
    }
}

/// Erases a method descriptor to its basic-type form.
///
/// Every reference is replaced by `Ljava/lang/Object;`, every subword integral type by `I`.
/// With `keep_last_arg` the trailing parameter keeps its exact descriptor, as required by the
/// static linker intrinsics whose last argument selects the target.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if the descriptor is invalid.
pub fn basic_type_signature(sig: &str, keep_last_arg: bool) -> Result<String> {
    fn erase(component: &SignatureType<'_>, out: &mut String) {
        match component.basic {
            BasicType::Object | BasicType::Array => {
                out.push('L');
                out.push_str(OBJECT);
                out.push(';');
            }
            basic if basic.is_subword() => out.push('I'),
            basic => out.push(basic.descriptor_char()),
        }
    }

    let parsed = parse_method(sig)?;
    let mut out = String::with_capacity(sig.len());
    out.push('(');
    let last = parsed.params.len().checked_sub(1);
    for (index, param) in parsed.params.iter().enumerate() {
        if keep_last_arg && Some(index) == last {
            out.push_str(param.text);
        } else {
            erase(param, &mut out);
        }
    }
    out.push(')');
    erase(&parsed.ret, &mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_parse_method_components() {
        let sig = parse_method("(IJ[[Ljava/lang/String;[B)Lcom/acme/Foo;").unwrap();
        let basics: Vec<_> = sig.params.iter().map(|p| p.basic).collect();
        assert_eq!(
            basics,
            vec![
                BasicType::Int,
                BasicType::Long,
                BasicType::Array,
                BasicType::Array
            ]
        );
        assert_eq!(sig.params[2].text, "[[Ljava/lang/String;");
        assert_eq!(sig.params[2].class_name(), Some("java/lang/String"));
        assert_eq!(sig.params[3].class_name(), None);
        assert_eq!(sig.ret.basic, BasicType::Object);
        assert_eq!(sig.ret.class_name(), Some("com/acme/Foo"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_method("I)V").is_err());
        assert!(parse_method("(I").is_err());
        assert!(parse_method("(V)V").is_err());
        assert!(parse_method("(Ljava/lang/String)V").is_err());
        assert!(parse_method("()VV").is_err());
        assert!(parse_field("V").is_err());
        assert!(parse_field("L;").is_err());
        assert!(parse_field("IJ").is_err());
    }

    #[test]
    fn test_referenced_class_names_of_field() {
        assert_eq!(
            referenced_class_names("[[Lcom/acme/Foo;").unwrap(),
            vec!["com/acme/Foo"]
        );
        assert!(referenced_class_names("[I").unwrap().is_empty());
    }

    #[test]
    fn test_basic_type_signature_keeps_last_argument() {
        let erased =
            basic_type_signature("(Ljava/lang/String;SLjava/lang/invoke/MemberName;)V", true)
                .unwrap();
        assert_eq!(
            erased,
            "(Ljava/lang/Object;ILjava/lang/invoke/MemberName;)V"
        );
        assert_eq!(basic_type_signature("()C", true).unwrap(), "()I");
    }

    #[test]
    fn test_descriptor_chars_round_trip() {
        for basic in BasicType::iter().filter(|b| !b.is_reference()) {
            let c = basic.descriptor_char() as u8;
            assert_eq!(BasicType::from_descriptor_char(c), Some(basic));
        }
        assert_eq!(BasicType::Int.to_string(), "int");
        assert_eq!(BasicType::Long.size_in_bytes(), 8);
    }
}
