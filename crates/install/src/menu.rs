//! Administrator menu entries of a component

use crate::context::OperationContext;
use crate::steps::InstallationStep;
use extman_errors::{Error, InstallError, StateError};
use extman_events::{AppEvent, EventEmitter, LifecycleEvent};
use extman_manifest::{ExtensionManifest, MenuSpec, SubmenuSpec};
use extman_state::{NewMenuNode, StateManager, ROOT_ID};
use extman_types::ClientScope;

const MENU_TYPE: &str = "main";
const NODE_TYPE: &str = "component";
const DEFAULT_IMG: &str = "class:component";

fn admin_client() -> i64 {
    ClientScope::Administrator.client_id()
}

/// Link of the component's root node
#[must_use]
pub fn root_link(element: &str, spec: &MenuSpec) -> String {
    match spec.link.as_deref().filter(|l| !l.is_empty()) {
        Some(link) => format!("index.php?{link}"),
        None => format!("index.php?option={element}"),
    }
}

/// Link of a submenu node: the override, or the option plus each declared
/// query parameter in fixed order
#[must_use]
pub fn submenu_link(element: &str, spec: &SubmenuSpec) -> String {
    if let Some(link) = spec.link.as_deref().filter(|l| !l.is_empty()) {
        return format!("index.php?{link}");
    }
    let mut link = format!("index.php?option={element}");
    for (key, value) in spec.query_params() {
        if let Some(value) = value {
            link.push('&');
            link.push_str(key);
            link.push('=');
            link.push_str(value);
        }
    }
    link
}

fn node(
    title: &str,
    alias: Option<&str>,
    link: String,
    img: Option<&str>,
    parent_id: i64,
    component_id: i64,
) -> NewMenuNode {
    let title = title.trim();
    NewMenuNode {
        menutype: MENU_TYPE.to_string(),
        title: title.to_string(),
        alias: alias
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(title)
            .to_string(),
        link,
        node_type: NODE_TYPE.to_string(),
        published: false,
        parent_id,
        component_id,
        client_id: admin_client(),
        img: img
            .filter(|i| !i.is_empty())
            .unwrap_or(DEFAULT_IMG)
            .to_string(),
        home: false,
    }
}

/// Insert a node; on an alias clash under the same parent, delete the stale
/// node carrying the same link and retry once
async fn insert_node(ctx: &mut OperationContext<'_>, node: &NewMenuNode) -> Result<i64, Error> {
    let id = match ctx.state.add_menu_node(node).await {
        Ok(id) => id,
        Err(Error::State(StateError::UniqueViolation { message, .. })) => {
            let stale = ctx
                .state
                .find_menu_by_link(&node.link, node.parent_id, node.client_id)
                .await?
                .ok_or_else(|| InstallError::MenuBuildFailed {
                    message: format!("menu alias '{}' is taken: {message}", node.alias),
                })?;
            ctx.emit_debug(format!(
                "removing stale menu node {} for {}",
                stale.id, node.link
            ));
            ctx.state.remove_menu_node(stale.id).await?;
            ctx.state.add_menu_node(node).await?
        }
        Err(err) => return Err(err),
    };
    ctx.push(InstallationStep::CreatedMenuNode { id });
    Ok(id)
}

/// Create the root and submenu nodes the manifest declares
///
/// Nothing is created for a manifest without a menu or with a hidden one.
/// Existing nodes are kept unless the operation overwrites.
///
/// # Errors
///
/// Returns `InstallError::MenuBuildFailed` or a state error; callers treat
/// either as a warning.
pub(crate) async fn build_admin_menus(
    ctx: &mut OperationContext<'_>,
    manifest: &ExtensionManifest,
    extension_id: i64,
) -> Result<(), Error> {
    let Some(spec) = manifest.admin_menu() else {
        ctx.emit_debug(format!("{} declares no administrator menu", ctx.element));
        return Ok(());
    };
    if spec.hidden {
        return Ok(());
    }

    if ctx
        .state
        .component_root_menu(extension_id, admin_client())
        .await?
        .is_some()
    {
        if !ctx.overwrite {
            return Ok(());
        }
        ctx.state
            .remove_component_menus(extension_id, admin_client())
            .await?;
    }

    let element = ctx.element.to_string();
    let root = node(
        &spec.title,
        spec.alias.as_deref(),
        root_link(&element, spec),
        spec.img.as_deref(),
        ROOT_ID,
        extension_id,
    );
    let root_id = insert_node(ctx, &root).await.map_err(menu_failed)?;
    let mut created = 1;

    for sub in manifest.submenus() {
        let child = node(
            &sub.title,
            sub.alias.as_deref(),
            submenu_link(&element, sub),
            sub.img.as_deref(),
            root_id,
            extension_id,
        );
        insert_node(ctx, &child).await.map_err(menu_failed)?;
        created += 1;
    }

    ctx.emit(AppEvent::Lifecycle(LifecycleEvent::MenuBuilt {
        route: ctx.route,
        element,
        nodes: created,
    }));
    Ok(())
}

fn menu_failed(err: Error) -> Error {
    match err {
        Error::Install(InstallError::MenuBuildFailed { .. }) => err,
        other => InstallError::MenuBuildFailed {
            message: other.to_string(),
        }
        .into(),
    }
}

/// Delete every administrator node of a component and renumber the tree
///
/// # Errors
///
/// Returns an error if the delete or the rebuild fails.
pub(crate) async fn remove_admin_menus(state: &StateManager, extension_id: i64) -> Result<u64, Error> {
    state
        .remove_component_menus(extension_id, admin_client())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submenu(view: Option<&str>, task: Option<&str>) -> SubmenuSpec {
        SubmenuSpec {
            title: "Posts".to_string(),
            alias: None,
            img: None,
            link: None,
            act: None,
            task: task.map(ToString::to_string),
            controller: None,
            view: view.map(ToString::to_string),
            layout: Some("default".to_string()),
            sub: None,
        }
    }

    #[test]
    fn submenu_params_follow_fixed_order() {
        let spec = submenu(Some("posts"), Some("list"));
        assert_eq!(
            submenu_link("com_blog", &spec),
            "index.php?option=com_blog&task=list&view=posts&layout=default"
        );
    }

    #[test]
    fn link_override_wins() {
        let mut spec = submenu(Some("posts"), None);
        spec.link = Some("option=com_blog&view=drafts".to_string());
        assert_eq!(
            submenu_link("com_blog", &spec),
            "index.php?option=com_blog&view=drafts"
        );
    }

    #[test]
    fn root_node_defaults() {
        let spec = MenuSpec {
            title: "  COM_BLOG ".to_string(),
            alias: None,
            img: None,
            link: None,
            hidden: false,
        };
        let root = node(
            &spec.title,
            spec.alias.as_deref(),
            root_link("com_blog", &spec),
            spec.img.as_deref(),
            ROOT_ID,
            7,
        );
        assert_eq!(root.title, "COM_BLOG");
        assert_eq!(root.alias, "COM_BLOG");
        assert_eq!(root.link, "index.php?option=com_blog");
        assert_eq!(root.img, "class:component");
        assert_eq!(root.client_id, 1);
        assert_eq!(root.menutype, "main");
        assert!(!root.published);
    }
}
