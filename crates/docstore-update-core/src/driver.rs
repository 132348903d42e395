//! Parsing a whole update expression and driving apply calls.
//!
//! An update expression is an object of modifier sections, e.g.
//! `{"$set": {"a.b": 5}, "$unset": {"c": true}}`. The driver compiles every
//! section into one shared tree, then applies that tree to any number of
//! documents.

use docstore_update_model::{Collation, UpdateError, UpdateErrorCode, Value};
use tracing::debug;

use crate::apply::{Applier, ApplyResult};
use crate::compile::parse_and_merge;
use crate::index_paths::IndexPathOracle;
use crate::log::LogBuilder;
use crate::modifier::{ModifierKind, ModifierRegistry};
use crate::node::ObjectNode;

/// Compiles an update expression and applies it to documents.
#[derive(Debug, Default)]
pub struct UpdateDriver {
    registry: ModifierRegistry,
    collation: Option<Collation>,
    root: ObjectNode,
    positional: bool,
}

impl UpdateDriver {
    /// A driver with the built-in modifiers and no collation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A driver with a caller-supplied modifier registry.
    #[must_use]
    pub fn with_registry(registry: ModifierRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    /// Set the collation forwarded to modifier constructors.
    pub fn set_collation(&mut self, collation: Collation) {
        self.collation = Some(collation);
    }

    /// Compile `update_expr` into this driver's tree.
    ///
    /// May be called more than once; later expressions merge into the same
    /// tree under the usual conflict rules. On error the driver must be
    /// discarded.
    ///
    /// # Errors
    ///
    /// - `FailedToParse` if the expression is not an object, a section
    ///   keyword is unknown, or a section operand is not an object.
    /// - Everything [`parse_and_merge`] can return per path.
    pub fn parse(&mut self, update_expr: &Value) -> Result<(), UpdateError> {
        let Some(sections) = update_expr.as_object() else {
            return Err(UpdateError::new(
                UpdateErrorCode::FailedToParse,
                format!(
                    "Update expression must be an object but was: {}",
                    update_expr.summary()
                ),
            ));
        };

        for (keyword, operand) in sections {
            let kind = ModifierKind::from_keyword(keyword).ok_or_else(|| {
                UpdateError::new(
                    UpdateErrorCode::FailedToParse,
                    format!("Unknown modifier: {keyword}"),
                )
            })?;
            let Some(fields) = operand.as_object() else {
                return Err(UpdateError::new(
                    UpdateErrorCode::FailedToParse,
                    format!(
                        "Modifiers operate on fields but we found {} instead",
                        operand.summary()
                    ),
                ));
            };
            for (path, value) in fields {
                let positional = parse_and_merge(
                    &mut self.root,
                    kind,
                    path,
                    value,
                    &self.registry,
                    self.collation.as_ref(),
                )?;
                self.positional |= positional;
            }
        }

        debug!(positional = self.positional, "parsed update expression");
        Ok(())
    }

    /// Whether any compiled path used the positional operator, in which case
    /// [`UpdateDriver::update`] needs a matched field.
    #[must_use]
    pub fn requires_matched_field(&self) -> bool {
        self.positional
    }

    /// The compiled tree.
    #[must_use]
    pub fn root(&self) -> &ObjectNode {
        &self.root
    }

    /// Apply the compiled tree to `doc`, returning the outcome and the
    /// replayable log document.
    ///
    /// # Errors
    ///
    /// Everything [`Applier::apply`] can return. On error `doc` may hold a
    /// partial mutation and must be discarded.
    pub fn update(
        &self,
        doc: &mut Value,
        matched_field: Option<&str>,
        from_replication: bool,
        index_paths: &dyn IndexPathOracle,
    ) -> Result<(ApplyResult, Value), UpdateError> {
        let applier = Applier::new(matched_field, from_replication, index_paths);
        let mut log = LogBuilder::new();
        let result = applier.apply(&self.root, doc, &mut log)?;
        Ok((result, log.into_document()))
    }
}
