//! Sentence embeddings with Hugging Face Candle
//!
//! Runs a BERT-family sentence-transformers encoder (all-MiniLM-L6-v2 by
//! default) locally: token embeddings, transformer encoder, attention-masked
//! mean pooling, then L2 normalisation.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{embedding, layer_norm, linear, Activation, Embedding, LayerNorm, Linear, VarBuilder};
use serde::Deserialize;
use tokenizers::Tokenizer;

use super::EmbeddingProvider;
use crate::error::FactCheckError;

/// Maximum number of tokens fed to the encoder
pub const MAX_SEQ_LEN: usize = 256;

/// Model configuration loaded from config.json
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub vocab_size: usize,
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub intermediate_size: usize,
    #[serde(default = "default_hidden_act")]
    pub hidden_act: String,
    pub max_position_embeddings: usize,
    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size: usize,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
}

fn default_hidden_act() -> String {
    "gelu".to_string()
}

fn default_type_vocab_size() -> usize {
    2
}

fn default_layer_norm_eps() -> f64 {
    1e-12
}

impl Default for Config {
    fn default() -> Self {
        // all-MiniLM-L6-v2
        Self {
            vocab_size: 30522,
            hidden_size: 384,
            num_hidden_layers: 6,
            num_attention_heads: 12,
            intermediate_size: 1536,
            hidden_act: default_hidden_act(),
            max_position_embeddings: 512,
            type_vocab_size: default_type_vocab_size(),
            layer_norm_eps: default_layer_norm_eps(),
        }
    }
}

struct BertEmbeddings {
    word_embeddings: Embedding,
    position_embeddings: Embedding,
    token_type_embeddings: Embedding,
    layer_norm: LayerNorm,
}

impl BertEmbeddings {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        Ok(Self {
            word_embeddings: embedding(config.vocab_size, config.hidden_size, vb.pp("word_embeddings"))?,
            position_embeddings: embedding(
                config.max_position_embeddings,
                config.hidden_size,
                vb.pp("position_embeddings"),
            )?,
            token_type_embeddings: embedding(
                config.type_vocab_size,
                config.hidden_size,
                vb.pp("token_type_embeddings"),
            )?,
            layer_norm: layer_norm(config.hidden_size, config.layer_norm_eps, vb.pp("LayerNorm"))?,
        })
    }

    fn forward(&self, input_ids: &Tensor, token_type_ids: &Tensor, position_ids: &Tensor) -> Result<Tensor> {
        let words = self.word_embeddings.forward(input_ids)?;
        let positions = self.position_embeddings.forward(position_ids)?;
        let token_types = self.token_type_embeddings.forward(token_type_ids)?;

        let embeddings = ((words + positions)? + token_types)?;
        Ok(self.layer_norm.forward(&embeddings)?)
    }
}

struct BertSelfAttention {
    query: Linear,
    key: Linear,
    value: Linear,
    num_attention_heads: usize,
    attention_head_size: usize,
}

impl BertSelfAttention {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let attention_head_size = config.hidden_size / config.num_attention_heads;
        let all_head_size = config.num_attention_heads * attention_head_size;

        Ok(Self {
            query: linear(config.hidden_size, all_head_size, vb.pp("query"))?,
            key: linear(config.hidden_size, all_head_size, vb.pp("key"))?,
            value: linear(config.hidden_size, all_head_size, vb.pp("value"))?,
            num_attention_heads: config.num_attention_heads,
            attention_head_size,
        })
    }

    /// [batch, seq, hidden] -> [batch, heads, seq, head_size]
    fn transpose_for_scores(&self, x: &Tensor) -> Result<Tensor> {
        let (batch, seq_len, _) = x.dims3()?;
        Ok(x
            .reshape((batch, seq_len, self.num_attention_heads, self.attention_head_size))?
            .transpose(1, 2)?
            .contiguous()?)
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let query = self.transpose_for_scores(&self.query.forward(hidden_states)?)?;
        let key = self.transpose_for_scores(&self.key.forward(hidden_states)?)?;
        let value = self.transpose_for_scores(&self.value.forward(hidden_states)?)?;

        let scores = query.matmul(&key.t()?.contiguous()?)?;
        let scores = (scores / (self.attention_head_size as f64).sqrt())?;
        let scores = scores.broadcast_add(attention_mask)?;

        let probs = candle_nn::ops::softmax_last_dim(&scores)?;
        let context = probs.matmul(&value)?.transpose(1, 2)?.contiguous()?;

        let (batch, seq_len, _, _) = context.dims4()?;
        Ok(context.reshape((batch, seq_len, self.num_attention_heads * self.attention_head_size))?)
    }
}

/// Dense projection + residual + layer norm, shared by attention and FFN outputs
struct BertResidualOutput {
    dense: Linear,
    layer_norm: LayerNorm,
}

impl BertResidualOutput {
    fn load(vb: VarBuilder, in_size: usize, config: &Config) -> Result<Self> {
        Ok(Self {
            dense: linear(in_size, config.hidden_size, vb.pp("dense"))?,
            layer_norm: layer_norm(config.hidden_size, config.layer_norm_eps, vb.pp("LayerNorm"))?,
        })
    }

    fn forward(&self, hidden_states: &Tensor, input_tensor: &Tensor) -> Result<Tensor> {
        let hidden_states = self.dense.forward(hidden_states)?;
        Ok(self.layer_norm.forward(&(hidden_states + input_tensor)?)?)
    }
}

struct BertLayer {
    attention: BertSelfAttention,
    attention_output: BertResidualOutput,
    intermediate: Linear,
    activation: Activation,
    output: BertResidualOutput,
}

impl BertLayer {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let activation = match config.hidden_act.as_str() {
            "relu" => Activation::Relu,
            _ => Activation::Gelu,
        };

        Ok(Self {
            attention: BertSelfAttention::load(vb.pp("attention").pp("self"), config)?,
            attention_output: BertResidualOutput::load(
                vb.pp("attention").pp("output"),
                config.hidden_size,
                config,
            )?,
            intermediate: linear(
                config.hidden_size,
                config.intermediate_size,
                vb.pp("intermediate").pp("dense"),
            )?,
            activation,
            output: BertResidualOutput::load(vb.pp("output"), config.intermediate_size, config)?,
        })
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let attended = self.attention.forward(hidden_states, attention_mask)?;
        let attended = self.attention_output.forward(&attended, hidden_states)?;

        let intermediate = self.activation.forward(&self.intermediate.forward(&attended)?)?;
        self.output.forward(&intermediate, &attended)
    }
}

struct BertModel {
    embeddings: BertEmbeddings,
    layers: Vec<BertLayer>,
}

impl BertModel {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let embeddings = BertEmbeddings::load(vb.pp("embeddings"), config)?;

        let vb_layers = vb.pp("encoder").pp("layer");
        let layers = (0..config.num_hidden_layers)
            .map(|i| BertLayer::load(vb_layers.pp(i), config))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { embeddings, layers })
    }

    fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        position_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        let mut hidden_states = self.embeddings.forward(input_ids, token_type_ids, position_ids)?;
        for layer in &self.layers {
            hidden_states = layer.forward(&hidden_states, attention_mask)?;
        }
        Ok(hidden_states)
    }
}

/// Candle-backed sentence embedding model
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dimension: usize,
}

impl BertEmbedder {
    /// Load a model directory containing `config.json`, `tokenizer.json` and
    /// `model.safetensors`.
    pub fn load(model_path: &Path) -> Result<Self> {
        let device = if candle_core::utils::cuda_is_available() {
            Device::new_cuda(0)?
        } else if candle_core::utils::metal_is_available() {
            Device::new_metal(0)?
        } else {
            Device::Cpu
        };

        tracing::info!("Loading embedding model on device: {:?}", device);

        let config_path = model_path.join("config.json");
        if !config_path.exists() {
            return Err(anyhow!("Config not found at {}", config_path.display()));
        }
        let config: Config = serde_json::from_str(&std::fs::read_to_string(&config_path)?)
            .map_err(|e| anyhow!("Failed to parse config.json: {}", e))?;

        let tokenizer_path = model_path.join("tokenizer.json");
        if !tokenizer_path.exists() {
            return Err(anyhow!("Tokenizer not found at {}", tokenizer_path.display()));
        }
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;

        let weights_path = model_path.join("model.safetensors");
        if !weights_path.exists() {
            return Err(anyhow!("Model weights not found at {}", weights_path.display()));
        }

        // SAFETY: the weights file is memory-mapped read-only and not modified
        // while the model is alive.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)? };

        // Plain BertModel checkpoints prefix every tensor with "bert."
        let vb = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
            vb.pp("bert")
        } else {
            vb
        };

        let model = BertModel::load(vb, &config)?;

        tracing::info!(
            "Loaded embedding model: {} layers, dimension {}",
            config.num_hidden_layers,
            config.hidden_size
        );

        Ok(Self {
            model,
            tokenizer,
            device,
            dimension: config.hidden_size,
        })
    }

    /// Download `repo` from the Hugging Face Hub and return the local model
    /// directory.
    pub fn download(repo: &str) -> Result<PathBuf> {
        use hf_hub::api::sync::Api;

        tracing::info!("Downloading {} from Hugging Face Hub...", repo);

        let api = Api::new()?;
        let repo = api.model(repo.to_string());

        let config = repo.get("config.json")?;
        repo.get("tokenizer.json")?;
        repo.get("model.safetensors")?;

        config
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| anyhow!("Downloaded model has no parent directory"))
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

        let seq_len = encoding.get_ids().len().min(MAX_SEQ_LEN);
        let ids = &encoding.get_ids()[..seq_len];
        let mask = &encoding.get_attention_mask()[..seq_len];

        let input_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(mask, &self.device)?.unsqueeze(0)?;
        let token_type_ids = Tensor::zeros((1, seq_len), DType::U32, &self.device)?;
        let positions: Vec<u32> = (0..seq_len as u32).collect();
        let position_ids = Tensor::new(&positions[..], &self.device)?.unsqueeze(0)?;

        let extended_mask = self.extended_attention_mask(&attention_mask)?;
        let output = self
            .model
            .forward(&input_ids, &token_type_ids, &position_ids, &extended_mask)?;

        let pooled = self.mean_pooling(&output, &attention_mask)?;
        let mut vector = pooled.squeeze(0)?.to_vec1::<f32>()?;
        crate::search::vector::l2_normalize(&mut vector);
        Ok(vector)
    }

    /// [1, seq] mask of 0/1 -> [1, 1, 1, seq] additive mask (0 keep, -10000 drop)
    fn extended_attention_mask(&self, attention_mask: &Tensor) -> Result<Tensor> {
        let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(1)?.unsqueeze(1)?;
        Ok((mask.affine(-1.0, 1.0)? * -10000.0)?)
    }

    /// Average token states over non-padding positions
    fn mean_pooling(&self, output: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
        let sum = output.broadcast_mul(&mask)?.sum(1)?;
        let count = mask.sum(1)?;
        Ok(sum.broadcast_div(&count)?)
    }
}

impl EmbeddingProvider for BertEmbedder {
    fn embed(&self, text: &str) -> crate::Result<Vec<f32>> {
        self.encode(text)
            .map_err(|e| FactCheckError::Embedding(e.to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "bert"
    }
}
