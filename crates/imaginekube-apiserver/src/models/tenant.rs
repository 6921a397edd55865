//! 租户模型
//!
//! 企业空间与企业空间模板的查询和写入。
//! 用户可见的企业空间由全局角色绑定与企业空间角色绑定决定。

use super::kube_error;
use crate::crd::{Workspace, WorkspaceTemplate};
use crate::informers::InformerFactory;
use crate::resources::{api_resource, CachedResource};
use imaginekube_common::constants::{ADMIN_USER_NAME, PLATFORM_ADMIN_ROLE, WORKSPACE_LABEL_KEY};
use imaginekube_common::{Error, ListResult, Pagination, Query, Result};
use kube::api::{Api, DeleteParams, DynamicObject, Patch, PatchParams, PostParams};
use kube::{Client, ResourceExt};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, info};

const WORKSPACE_TEMPLATES: &str = "workspacetemplates";
const IAM_GROUP: &str = "iam.imaginekube.com";
const IAM_VERSION: &str = "v1alpha2";
const USER_KIND: &str = "User";

/// 租户操作
pub struct TenantOperator {
    client: Option<Client>,
    workspaces: CachedResource<Workspace>,
    templates: CachedResource<WorkspaceTemplate>,
    global_role_bindings: CachedResource<DynamicObject>,
    workspace_role_bindings: CachedResource<DynamicObject>,
}

impl TenantOperator {
    /// 创建租户操作，缓存与资源查询注册表共享
    pub fn new(factory: &InformerFactory) -> Self {
        let global = api_resource(IAM_GROUP, IAM_VERSION, "GlobalRoleBinding", "globalrolebindings");
        let workspace =
            api_resource(IAM_GROUP, IAM_VERSION, "WorkspaceRoleBinding", "workspacerolebindings");
        Self {
            client: factory.client(),
            workspaces: CachedResource::new("workspaces", factory.store::<Workspace>()),
            templates: CachedResource::new(WORKSPACE_TEMPLATES, factory.store::<WorkspaceTemplate>()),
            global_role_bindings: CachedResource::new_with(
                "globalrolebindings",
                factory.dynamic_store(&global),
                global.clone(),
            ),
            workspace_role_bindings: CachedResource::new_with(
                "workspacerolebindings",
                factory.dynamic_store(&workspace),
                workspace.clone(),
            ),
        }
    }

    /// 列出用户可见的企业空间模板
    pub fn list_workspaces(&self, user: &str, query: &Query) -> Result<ListResult> {
        if self.is_platform_admin(user) {
            debug!("用户 {} 为平台管理员，返回全部企业空间", user);
            return self.templates.list_objects("", query).and_then(to_list_result);
        }

        let granted = self.granted_workspaces(user);
        if granted.is_empty() {
            return Ok(ListResult::default());
        }

        let mut unpaged = query.clone();
        unpaged.pagination = Pagination::none();
        let (templates, _) = self.templates.list_objects("", &unpaged)?;
        let mut visible: Vec<WorkspaceTemplate> = templates
            .into_iter()
            .filter(|template| granted.contains(&template.name_any()))
            .collect();

        let total = visible.len();
        let (start, end) = query.pagination.valid_range(total);
        to_list_result((visible.drain(start..end).collect(), total))
    }

    /// 获取企业空间
    pub fn get_workspace(&self, name: &str) -> Result<Workspace> {
        self.workspaces.get_object("", name)
    }

    /// 获取企业空间模板
    pub fn describe_workspace_template(&self, name: &str) -> Result<WorkspaceTemplate> {
        self.templates.get_object("", name)
    }

    /// 创建企业空间模板
    pub async fn create_workspace_template(
        &self,
        template: &WorkspaceTemplate,
    ) -> Result<WorkspaceTemplate> {
        let name = template.name_any();
        let created = self
            .api()?
            .create(&PostParams::default(), template)
            .await
            .map_err(|e| kube_error(WORKSPACE_TEMPLATES, &name, e))?;
        info!("创建企业空间模板 {}", name);
        Ok(created)
    }

    /// 替换企业空间模板
    pub async fn update_workspace_template(
        &self,
        name: &str,
        template: &WorkspaceTemplate,
    ) -> Result<WorkspaceTemplate> {
        if template.name_any() != name {
            return Err(Error::BadRequest(format!(
                "企业空间名称 {} 与路径参数 {} 不一致",
                template.name_any(),
                name
            )));
        }
        let updated = self
            .api()?
            .replace(name, &PostParams::default(), template)
            .await
            .map_err(|e| kube_error(WORKSPACE_TEMPLATES, name, e))?;
        info!("更新企业空间模板 {}", name);
        Ok(updated)
    }

    /// 以合并补丁修改企业空间模板
    pub async fn patch_workspace_template(&self, name: &str, patch: &Value) -> Result<WorkspaceTemplate> {
        let patched = self
            .api()?
            .patch(name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .map_err(|e| kube_error(WORKSPACE_TEMPLATES, name, e))?;
        info!("修改企业空间模板 {}", name);
        Ok(patched)
    }

    /// 删除企业空间模板
    pub async fn delete_workspace_template(&self, name: &str) -> Result<()> {
        self.api()?
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| kube_error(WORKSPACE_TEMPLATES, name, e))?;
        info!("删除企业空间模板 {}", name);
        Ok(())
    }

    fn api(&self) -> Result<Api<WorkspaceTemplate>> {
        self.client
            .clone()
            .map(Api::all)
            .ok_or_else(|| Error::Kubernetes("未连接 Kubernetes 集群".to_string()))
    }

    fn is_platform_admin(&self, user: &str) -> bool {
        if user == ADMIN_USER_NAME {
            return true;
        }
        self.global_role_bindings
            .list_objects("", &Query::new())
            .map(|(bindings, _)| {
                bindings.iter().any(|binding| {
                    role_ref_name(binding) == Some(PLATFORM_ADMIN_ROLE)
                        && has_user_subject(binding, user)
                })
            })
            .unwrap_or(false)
    }

    fn granted_workspaces(&self, user: &str) -> BTreeSet<String> {
        self.workspace_role_bindings
            .list_objects("", &Query::new())
            .map(|(bindings, _)| {
                bindings
                    .iter()
                    .filter(|binding| has_user_subject(binding, user))
                    .filter_map(|binding| binding.labels().get(WORKSPACE_LABEL_KEY).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn role_ref_name(binding: &DynamicObject) -> Option<&str> {
    binding.data.pointer("/roleRef/name").and_then(Value::as_str)
}

fn has_user_subject(binding: &DynamicObject, user: &str) -> bool {
    binding
        .data
        .get("subjects")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .any(|subject| {
            subject.get("kind").and_then(Value::as_str) == Some(USER_KIND)
                && subject.get("name").and_then(Value::as_str) == Some(user)
        })
}

fn to_list_result((templates, total): (Vec<WorkspaceTemplate>, usize)) -> Result<ListResult> {
    let items = templates
        .into_iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ListResult::new(items, total))
}
