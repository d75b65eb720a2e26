// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable element descriptions.
//!
//! An [`Element`] describes *what should exist*: a [`Kind`], a [`Props`] bag
//! and an ordered list of child elements. Elements are cheap to clone (their
//! data is shared) and are never mutated after creation. The reconciler only
//! ever compares them by value.
//!
//! Text is never passed raw into the tree. [`Element::text`] (and the `From`
//! conversions for `&str` and `String`) wrap it in an element of kind
//! [`Kind::Text`] carrying a single [`NODE_VALUE`] property.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::props::{PropValue, Props};

/// Name of the property that carries the content of a text element.
pub const NODE_VALUE: &str = "nodeValue";

/// The type tag of an element or fiber.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    /// A host node type, e.g. `div`.
    Host(Rc<str>),
    /// The reserved text node type.
    Text,
}

impl Kind {
    /// Creates a host kind with the given tag name.
    #[must_use]
    pub fn host(name: &str) -> Self {
        Self::Host(Rc::from(name))
    }

    /// Returns `true` for [`Kind::Text`].
    #[inline]
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text)
    }

    /// Returns the host tag name, or `None` for text.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Host(name) => Some(name),
            Self::Text => None,
        }
    }
}

impl From<&str> for Kind {
    fn from(name: &str) -> Self {
        Self::host(name)
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host(name) => write!(f, "<{name}>"),
            Self::Text => f.write_str("#text"),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host(name) => f.write_str(name),
            Self::Text => f.write_str("#text"),
        }
    }
}

/// An immutable description of a node and its subtree.
#[derive(Clone, PartialEq)]
pub struct Element {
    kind: Kind,
    props: Rc<Props>,
    children: Rc<[Self]>,
}

impl Element {
    /// Creates an element.
    ///
    /// Children may be anything convertible into an element, so bare text is
    /// wrapped automatically:
    ///
    /// ```
    /// use fibril_core::element::Element;
    /// use fibril_core::props::Props;
    ///
    /// let title = Element::new("h1", Props::new(), ["Hello"]);
    /// assert_eq!(title.children().len(), 1);
    /// assert!(title.children()[0].kind().is_text());
    /// ```
    pub fn new<C>(kind: impl Into<Kind>, props: Props, children: C) -> Self
    where
        C: IntoIterator,
        C::Item: Into<Self>,
    {
        let children: Vec<Self> = children.into_iter().map(Into::into).collect();
        Self {
            kind: kind.into(),
            props: Rc::new(props),
            children: children.into(),
        }
    }

    /// Creates an element with no properties.
    pub fn bare<C>(kind: impl Into<Kind>, children: C) -> Self
    where
        C: IntoIterator,
        C::Item: Into<Self>,
    {
        Self::new(kind, Props::new(), children)
    }

    /// Creates an element without children.
    #[must_use]
    pub fn leaf(kind: impl Into<Kind>, props: Props) -> Self {
        Self {
            kind: kind.into(),
            props: Rc::new(props),
            children: Vec::new().into(),
        }
    }

    /// Creates a text element.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        let value: String = value.into();
        Self {
            kind: Kind::Text,
            props: Rc::new(Props::new().with(NODE_VALUE, PropValue::Str(value))),
            children: Vec::new().into(),
        }
    }

    /// Returns the element's kind.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Returns the element's properties.
    #[inline]
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Returns the element's children.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Shared handle to the props, for fibers copied from this element.
    pub(crate) fn shared_props(&self) -> Rc<Props> {
        Rc::clone(&self.props)
    }

    /// Shared handle to the children, for fibers copied from this element.
    pub(crate) fn shared_children(&self) -> Rc<[Self]> {
        Rc::clone(&self.children)
    }
}

impl From<&str> for Element {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Element {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("kind", &self.kind)
            .field("props", &self.props)
            .field("children", &self.children)
            .finish()
    }
}
