//! Tools over the travel store: friends and points of interest.
//!
//! Duplicate names and unknown friends come back as store errors so the
//! dispatcher reports them as failed tool runs.

use async_trait::async_trait;
use std::sync::Arc;
use umbra_core::error::ToolError;
use umbra_core::tool::{Arity, Tool};
use umbra_memory::{Friend, PointOfInterest, TravelStore};

/// Pull exactly `N` arguments out of `args`, trimming each.
fn take_args<const N: usize>(tool: &str, args: Vec<String>) -> Result<[String; N], ToolError> {
    let args: Vec<String> = args.into_iter().map(|a| a.trim().to_string()).collect();
    args.try_into().map_err(|got: Vec<String>| {
        ToolError::InvalidArguments(format!("{tool} takes {N} arguments, got {}", got.len()))
    })
}

fn require_name(name: &str) -> Result<(), ToolError> {
    if name.is_empty() {
        Err(ToolError::InvalidArguments("a name is required".into()))
    } else {
        Ok(())
    }
}

pub struct AddFriendTool {
    store: Arc<TravelStore>,
}

impl AddFriendTool {
    pub fn new(store: Arc<TravelStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for AddFriendTool {
    fn name(&self) -> &str {
        "add-friend"
    }

    fn description(&self) -> &str {
        "Remember a friend and where they live. Args: [name, location, notes]."
    }

    fn arity(&self) -> Arity {
        Arity::Exact(3)
    }

    async fn execute(&self, args: Vec<String>) -> Result<Option<String>, ToolError> {
        let [name, location, notes] = take_args::<3>(self.name(), args)?;
        require_name(&name)?;
        self.store
            .add_friend(&Friend { name: name.clone(), location, notes })
            .await?;
        Ok(Some(format!("Friend '{name}' added to the database.")))
    }
}

pub struct AddPoiTool {
    store: Arc<TravelStore>,
}

impl AddPoiTool {
    pub fn new(store: Arc<TravelStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for AddPoiTool {
    fn name(&self) -> &str {
        "add-poi"
    }

    fn description(&self) -> &str {
        "Save a point of interest to visit. Args: [name, type, location, notes]."
    }

    fn arity(&self) -> Arity {
        Arity::Exact(4)
    }

    async fn execute(&self, args: Vec<String>) -> Result<Option<String>, ToolError> {
        let [name, kind, location, notes] = take_args::<4>(self.name(), args)?;
        require_name(&name)?;
        self.store
            .add_poi(&PointOfInterest { name: name.clone(), kind, location, notes })
            .await?;
        Ok(Some(format!("POI '{name}' added to the database.")))
    }
}

pub struct UpdateFriendTool {
    store: Arc<TravelStore>,
}

impl UpdateFriendTool {
    pub fn new(store: Arc<TravelStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for UpdateFriendTool {
    fn name(&self) -> &str {
        "update-friend"
    }

    fn description(&self) -> &str {
        "Change where a friend lives; partial names match. Args: [name, new location]."
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    async fn execute(&self, args: Vec<String>) -> Result<Option<String>, ToolError> {
        let [name, location] = take_args::<2>(self.name(), args)?;
        require_name(&name)?;
        let stored = self.store.update_friend_location(&name, &location).await?;
        Ok(Some(format!("Updated location for '{stored}' to '{location}'.")))
    }
}

pub struct ListFriendsTool {
    store: Arc<TravelStore>,
}

impl ListFriendsTool {
    pub fn new(store: Arc<TravelStore>) -> Self {
        Self { store }
    }
}

fn format_friends(friends: &[Friend]) -> String {
    if friends.is_empty() {
        return "Your friends list is currently empty.".into();
    }
    friends
        .iter()
        .map(|f| format!("- Name: {}\n  Location: {}\n  Notes: {}", f.name, f.location, f.notes))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Tool for ListFriendsTool {
    fn name(&self) -> &str {
        "list-friends"
    }

    fn description(&self) -> &str {
        "List every saved friend with location and notes. No args."
    }

    fn arity(&self) -> Arity {
        Arity::Exact(0)
    }

    async fn execute(&self, _args: Vec<String>) -> Result<Option<String>, ToolError> {
        let friends = self.store.list_friends().await?;
        Ok(Some(format_friends(&friends)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::error::MemoryError;

    async fn store() -> Arc<TravelStore> {
        Arc::new(TravelStore::open("sqlite::memory:").await.unwrap())
    }

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn add_then_list() {
        let db = store().await;
        let out = AddFriendTool::new(db.clone())
            .execute(args(&["Sam Carter", "Denver", "climbing buddy"]))
            .await
            .unwrap();
        assert_eq!(out.as_deref(), Some("Friend 'Sam Carter' added to the database."));

        let list = ListFriendsTool::new(db).execute(vec![]).await.unwrap().unwrap();
        assert_eq!(list, "- Name: Sam Carter\n  Location: Denver\n  Notes: climbing buddy");
    }

    #[tokio::test]
    async fn empty_list_message() {
        let out = ListFriendsTool::new(store().await).execute(vec![]).await.unwrap();
        assert_eq!(out.as_deref(), Some("Your friends list is currently empty."));
    }

    #[tokio::test]
    async fn duplicate_friend_is_a_store_error() {
        let db = store().await;
        let tool = AddFriendTool::new(db);
        tool.execute(args(&["Sam", "Denver", ""])).await.unwrap();
        let err = tool.execute(args(&["Sam", "Boulder", ""])).await.unwrap_err();
        assert!(matches!(err, ToolError::Store(MemoryError::Duplicate(_))));
    }

    #[tokio::test]
    async fn add_poi_and_duplicate() {
        let tool = AddPoiTool::new(store().await);
        let out = tool
            .execute(args(&["Blue Bottle", "cafe", "Oakland", "pour-over"]))
            .await
            .unwrap();
        assert_eq!(out.as_deref(), Some("POI 'Blue Bottle' added to the database."));
        assert!(tool.execute(args(&["Blue Bottle", "cafe", "SF", ""])).await.is_err());
    }

    #[tokio::test]
    async fn update_reports_stored_name() {
        let db = store().await;
        AddFriendTool::new(db.clone())
            .execute(args(&["Sam Carter", "Denver", ""]))
            .await
            .unwrap();

        let tool = UpdateFriendTool::new(db);
        let out = tool.execute(args(&["sam", "Seattle"])).await.unwrap();
        assert_eq!(out.as_deref(), Some("Updated location for 'Sam Carter' to 'Seattle'."));

        let err = tool.execute(args(&["Nobody", "Mars"])).await.unwrap_err();
        assert!(matches!(err, ToolError::Store(MemoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn wrong_count_and_blank_name_are_invalid() {
        let tool = AddFriendTool::new(store().await);
        assert!(matches!(
            tool.execute(args(&["Sam"])).await,
            Err(ToolError::InvalidArguments(_))
        ));
        assert!(matches!(
            tool.execute(args(&[" ", "Denver", ""])).await,
            Err(ToolError::InvalidArguments(_))
        ));
    }
}
