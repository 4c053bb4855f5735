//! Invocable commands bound to view-model methods.
//!
//! A [`Command`] pairs a method member with an optional bool gate member. The
//! gate is read on every [`can_execute`](Command::can_execute) call, so it
//! always reflects the current model state. [`execute`](Command::execute) does
//! not consult the gate: callers check first.

use std::fmt;
use std::sync::Arc;

use tableau_core::logging::targets;

use crate::bar::ButtonOptions;
use crate::error::{BindError, BindResult};
use crate::member::{MemberDef, MemberKind};
use crate::object::ObjectRef;
use crate::schema::BackgroundWork;
use crate::value::Value;

/// What a surface does with a command that cannot execute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommandOption {
    /// Show it disabled.
    #[default]
    Disable,
    /// Hide it.
    Hide,
}

/// A method bound to the object that owns it, plus an optional gate.
#[derive(Clone)]
pub struct Command {
    owner: ObjectRef,
    member: Arc<MemberDef>,
    gate: Option<(ObjectRef, Arc<MemberDef>)>,
    option: CommandOption,
}

impl Command {
    /// Bind method `member` of `target`, gated by bool member `can_execute`.
    ///
    /// Both names are looked up on `target` first, then on its data context.
    /// A missing method or a gate that is not bool is a configuration error. A
    /// gate that cannot be found is logged and ignored.
    pub fn bind(
        target: &ObjectRef,
        member: &str,
        can_execute: Option<&str>,
        option: CommandOption,
    ) -> BindResult<Self> {
        let (owner, def) = target.locate(member).ok_or_else(|| BindError::MissingMember {
            type_name: target.type_name().to_string(),
            member: member.to_string(),
        })?;
        if !def.kind().is_method() {
            return Err(BindError::NotInvocable {
                type_name: owner.type_name().to_string(),
                member: member.to_string(),
            });
        }

        let gate = match can_execute {
            Some(name) => Self::bind_gate(target, name)?,
            None => None,
        };

        tracing::trace!(
            target: targets::COMMAND,
            owner = owner.type_name(),
            member,
            gated = gate.is_some(),
            "bound command"
        );
        Ok(Self {
            owner,
            member: def,
            gate,
            option,
        })
    }

    /// Bind a method using the gate and policy of its button directive.
    pub fn from_button(target: &ObjectRef, member: &str, options: &ButtonOptions) -> BindResult<Self> {
        Self::bind(target, member, options.can_execute.as_deref(), options.option)
    }

    fn bind_gate(target: &ObjectRef, name: &str) -> BindResult<Option<(ObjectRef, Arc<MemberDef>)>> {
        let Some((owner, def)) = target.locate(name) else {
            tracing::warn!(
                target: targets::COMMAND,
                owner = target.type_name(),
                gate = name,
                "can-execute member not found, command is always enabled"
            );
            return Ok(None);
        };
        check_bool(&owner, &def)?;
        Ok(Some((owner, def)))
    }

    /// Whether the command may run now. Always true without a gate.
    pub fn can_execute(&self) -> bool {
        match &self.gate {
            Some((owner, def)) => owner
                .read_member(def)
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            None => true,
        }
    }

    /// Invoke the method. Does not check [`can_execute`](Self::can_execute).
    pub fn execute(&self, param: Option<&Value>) -> BindResult<()> {
        tracing::debug!(
            target: targets::COMMAND,
            owner = self.owner.type_name(),
            member = self.member.name(),
            "executing command"
        );
        self.owner.invoke_member(&self.member, param)
    }

    /// Split the command for a background run: the prepare step runs now,
    /// the returned work may run on another thread. `None` unless the method
    /// was described with [`Schema::background_method`](crate::Schema::background_method).
    pub(crate) fn begin_background(&self) -> Option<BackgroundWork> {
        tracing::debug!(
            target: targets::COMMAND,
            owner = self.owner.type_name(),
            member = self.member.name(),
            "starting background command"
        );
        self.owner.begin_background(&self.member)
    }

    /// Whether the bound method runs its work off the UI thread.
    pub fn runs_in_background(&self) -> bool {
        self.member.runs_in_background()
    }

    /// Disabled-state policy.
    pub fn option(&self) -> CommandOption {
        self.option
    }

    /// Whether a surface should show the command enabled.
    pub fn is_enabled(&self) -> bool {
        self.option == CommandOption::Hide || self.can_execute()
    }

    /// Whether a surface should show the command at all.
    pub fn is_visible(&self) -> bool {
        self.option == CommandOption::Disable || self.can_execute()
    }

    /// Name of the bound method.
    pub fn member_name(&self) -> &'static str {
        self.member.name()
    }

    /// Object owning the bound method.
    pub fn owner(&self) -> &ObjectRef {
        &self.owner
    }
}

/// Fail unless `def` on `owner` is a bool member.
pub(crate) fn check_bool(owner: &ObjectRef, def: &MemberDef) -> BindResult<()> {
    let found = match def.kind() {
        MemberKind::Bool => return Ok(()),
        MemberKind::Value => match owner.read_member(def) {
            Some(Value::Bool(_)) => return Ok(()),
            Some(other) => other.kind_name(),
            None => "none",
        },
        kind => kind.name(),
    };
    Err(BindError::GateNotBool {
        type_name: owner.type_name().to_string(),
        member: def.name().to_string(),
        found,
    })
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("owner", &self.owner.type_name())
            .field("member", &self.member.name())
            .field("gate", &self.gate.as_ref().map(|(_, def)| def.name()))
            .field("option", &self.option)
            .finish()
    }
}

static_assertions::assert_impl_all!(Command: Send, Sync, Clone);
