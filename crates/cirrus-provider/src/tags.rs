//! Tag reconciliation for taggable resources
//!
//! `tags_all` is what the remote object carries: provider defaults merged
//! under the resource's own tags. `tags` is what the configuration owns.

use cirrus_client::{ClientError, ResourceTagger};
use cirrus_core::KeyValueTags;
use std::collections::BTreeMap;
use tracing::debug;

use crate::conns::TagsContext;

/// Full tag set a resource should carry for its configured `tags`
pub fn desired_tags_all(ctx: &TagsContext, configured: &BTreeMap<String, String>) -> KeyValueTags {
    ctx.default_tags
        .merge(&KeyValueTags::from(configured.clone()))
        .ignore_system()
        .ignore(&ctx.ignore)
}

/// Tags as read back: `(tags, tags_all)`
pub fn split_remote_tags(
    ctx: &TagsContext,
    remote: BTreeMap<String, String>,
    configured: &BTreeMap<String, String>,
) -> (BTreeMap<String, String>, BTreeMap<String, String>) {
    let all = KeyValueTags::from(remote).ignore_system().ignore(&ctx.ignore);
    let configured = KeyValueTags::from(configured.clone());
    let own = all.remove_defaults(&ctx.default_tags, &configured);
    (own.into_map(), all.into_map())
}

/// List the tags of `arn` and split them into `(tags, tags_all)`
pub async fn read_tags<T>(
    tagger: &T,
    ctx: &TagsContext,
    arn: &str,
    configured: &BTreeMap<String, String>,
) -> Result<(BTreeMap<String, String>, BTreeMap<String, String>), ClientError>
where
    T: ResourceTagger + ?Sized,
{
    let remote = tagger.list_tags(arn).await?;
    Ok(split_remote_tags(ctx, remote, configured))
}

/// Move the tags of `arn` from `old` to `new`
///
/// Removed keys are untagged first, then new or changed keys are tagged.
pub async fn update_tags<T>(tagger: &T, arn: &str, old: &KeyValueTags, new: &KeyValueTags) -> Result<(), ClientError>
where
    T: ResourceTagger + ?Sized,
{
    let removed = old.removed(new);
    if !removed.is_empty() {
        debug!(arn, keys = ?removed.keys(), "untagging resource");
        tagger.untag_resource(arn, removed.keys()).await?;
    }

    let updated = old.updated(new);
    if !updated.is_empty() {
        debug!(arn, keys = ?updated.keys(), "tagging resource");
        tagger.tag_resource(arn, updated.into_map()).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_client::codecommit::CreateRepositoryInput;
    use cirrus_client::{CodeCommitApi, MockCodeCommit};
    use cirrus_core::IgnoreConfig;

    fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn context() -> TagsContext {
        TagsContext {
            default_tags: [("team", "platform"), ("env", "dev")].into_iter().collect(),
            ignore: IgnoreConfig {
                keys: Default::default(),
                key_prefixes: vec!["scanner:".to_string()],
            },
        }
    }

    #[test]
    fn test_desired_tags_all_resource_wins() {
        let all = desired_tags_all(&context(), &tags(&[("env", "prod"), ("app", "kb")]));
        assert_eq!(
            all.into_map(),
            tags(&[("app", "kb"), ("env", "prod"), ("team", "platform")])
        );
    }

    #[test]
    fn test_split_remote_tags() {
        let remote = tags(&[
            ("team", "platform"),
            ("env", "dev"),
            ("app", "kb"),
            ("aws:cloudformation:stack-name", "x"),
            ("scanner:last-run", "today"),
        ]);

        let (own, all) = split_remote_tags(&context(), remote.clone(), &tags(&[("env", "dev")]));
        assert_eq!(own, tags(&[("app", "kb"), ("env", "dev")]));
        assert_eq!(all, tags(&[("app", "kb"), ("env", "dev"), ("team", "platform")]));

        let (imported, _) = split_remote_tags(&context(), remote, &BTreeMap::new());
        assert_eq!(imported, tags(&[("app", "kb")]));
    }

    #[tokio::test]
    async fn test_update_tags_untags_before_tagging() {
        let mock = MockCodeCommit::new();
        let created = mock
            .create_repository(CreateRepositoryInput {
                repository_name: "repo".to_string(),
                tags: tags(&[("key1", "value1"), ("stale", "x")]),
                ..Default::default()
            })
            .await
            .unwrap();
        let arn = created.repository_metadata.and_then(|m| m.arn).unwrap();
        mock.clear_calls();

        let old = KeyValueTags::from(tags(&[("key1", "value1"), ("stale", "x")]));
        let new = KeyValueTags::from(tags(&[("key1", "value1updated"), ("key2", "value2")]));
        update_tags(&mock, &arn, &old, &new).await.unwrap();

        assert_eq!(mock.calls(), vec!["UntagResource", "TagResource"]);
        assert_eq!(
            mock.repository_tags("repo").unwrap(),
            tags(&[("key1", "value1updated"), ("key2", "value2")])
        );
    }

    #[tokio::test]
    async fn test_update_tags_without_changes_makes_no_calls() {
        let mock = MockCodeCommit::new();
        let same = KeyValueTags::from(tags(&[("k", "v")]));
        update_tags(&mock, "arn:aws:codecommit:us-west-2:123456789012:repo", &same, &same)
            .await
            .unwrap();
        assert!(mock.calls().is_empty());
    }
}
