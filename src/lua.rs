//! Lua binding for the skip list
//!
//! Exposes a `skiplist` module whose `new([seed])` returns a userdata with
//! the classic zset-style method set:
//!
//! ```lua
//! local sl = skiplist.new()
//! sl:insert(3, "c")              -- errors if (3, "c") is already present
//! sl:get_rank(3, "c")            --> 1 (nil when absent)
//! sl:get_rank_range(1, 10)       --> { "c" }
//! sl:get_score_range(5, 0)       --> descending scores
//! sl:delete_by_rank(1, 2, function(member) ... end)
//! ```
//!
//! Members are binary-safe Lua strings. The callback given to
//! `delete_by_rank` sees each member just before it is dropped.

use crate::data::{Member, SkipList};
use mlua::{Function, Lua, MetaMethod, Result as LuaResult, Table, UserData, UserDataMethods};

/// Userdata wrapper owning one skip list
pub struct LuaSkipList {
    inner: SkipList,
}

impl LuaSkipList {
    pub fn new(seed: Option<u64>) -> Self {
        let inner = match seed {
            Some(seed) => SkipList::seeded(seed),
            None => SkipList::new(),
        };
        LuaSkipList { inner }
    }
}

fn member_from_lua(member: &mlua::String) -> LuaResult<Member> {
    let bytes = member.as_bytes();
    Member::try_new(&bytes).map_err(mlua::Error::external)
}

fn members_to_lua(lua: &Lua, members: Vec<&Member>) -> LuaResult<Vec<mlua::String>> {
    members
        .into_iter()
        .map(|member| lua.create_string(member.as_bytes()))
        .collect()
}

impl UserData for LuaSkipList {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        // Duplicate pairs and NaN scores raise a Lua error
        methods.add_method_mut("insert", |_, this, (score, member): (f64, mlua::String)| {
            let member = member_from_lua(&member)?;
            this.inner
                .try_insert(score, member)
                .map_err(mlua::Error::external)?;
            Ok(())
        });

        methods.add_method_mut("delete", |_, this, (score, member): (f64, mlua::String)| {
            Ok(this.inner.delete(score, &member.as_bytes()))
        });

        methods.add_method_mut(
            "delete_by_rank",
            |lua, this, (start, end, callback): (usize, usize, Function)| {
                let (start, end) = if start > end { (end, start) } else { (start, end) };
                let mut failure = None;
                let removed = this.inner.delete_by_rank(start, end, |member| {
                    if failure.is_some() {
                        return;
                    }
                    let delivered = lua
                        .create_string(member.as_bytes())
                        .and_then(|s| callback.call::<()>(s));
                    if let Err(err) = delivered {
                        failure = Some(err);
                    }
                });
                match failure {
                    Some(err) => Err(err),
                    None => Ok(removed),
                }
            },
        );

        methods.add_method("get_count", |_, this, ()| Ok(this.inner.len()));

        methods.add_method("get_rank", |_, this, (score, member): (f64, mlua::String)| {
            Ok(this.inner.rank_of(score, &member.as_bytes()))
        });

        methods.add_method("get_rank_range", |lua, this, (r1, r2): (usize, usize)| {
            members_to_lua(lua, this.inner.rank_range(r1, r2))
        });

        methods.add_method("get_score_range", |lua, this, (s1, s2): (f64, f64)| {
            members_to_lua(lua, this.inner.score_range(s1, s2))
        });

        methods.add_method("dump", |_, this, ()| {
            let stdout = std::io::stdout();
            this.inner
                .dump(&mut stdout.lock())
                .map_err(mlua::Error::external)
        });

        methods.add_meta_method(MetaMethod::Len, |_, this, ()| Ok(this.inner.len()));
    }
}

/// Build the `skiplist` module table.
pub fn register(lua: &Lua) -> LuaResult<Table> {
    let module = lua.create_table()?;
    module.set(
        "new",
        lua.create_function(|_, seed: Option<u64>| Ok(LuaSkipList::new(seed)))?,
    )?;
    Ok(module)
}
